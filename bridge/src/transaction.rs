// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Bridge transaction model and its pure validation rules.
//!
//! A [`BridgeTransaction`] is what a caller hands to the dispatch service. It
//! carries the token and amount the way a user wrote them. [`validate`] turns
//! it into a [`ValidTransaction`] with typed fields, checking in order:
//! token address, amount, target chain. Validation is never cached; every
//! dispatch operation runs it again.

use crate::error::ValidationError;
use crate::types::{ChainWhitelist, RequestHash, DEFAULT_TOKEN_DECIMALS};
use ethers::types::{Address as EthAddress, Bytes, U256};
use ethers::utils::{parse_units, to_checksum, ParseUnits};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const ADDRESS_HEX_LEN: usize = 40;
pub(crate) const MAX_U256_DIGITS: usize = 77;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeTransaction {
    /// ERC-20 contract address, or the native-token sentinel
    pub token: String,
    /// Human-readable decimal amount, e.g. "100" or "0.25"
    pub amount: String,
    pub target_chain_id: u64,
    /// Opaque payload passed through to the contract call
    #[serde(default)]
    pub data: Bytes,
}

impl BridgeTransaction {
    pub fn new(token: impl Into<String>, amount: impl Into<String>, target_chain_id: u64) -> Self {
        Self {
            token: token.into(),
            amount: amount.into(),
            target_chain_id,
            data: Bytes::default(),
        }
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }
}

/// A transaction whose fields passed every local check, in contract-call form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidTransaction {
    pub token: EthAddress,
    /// Amount in the token's smallest unit, strictly positive
    pub amount: U256,
    pub target_chain_id: u64,
    pub data: Bytes,
}

impl ValidTransaction {
    /// The dedup key the registry contract derives for this transaction
    /// when it is executed in a block with the given timestamp.
    pub fn request_hash_at(&self, block_timestamp: u64) -> RequestHash {
        RequestHash::compute(
            self.token,
            self.amount,
            self.target_chain_id,
            &self.data,
            block_timestamp,
        )
    }
}

/// Validate with the default (ether-style, 18 decimals) amount precision.
pub fn validate(
    transaction: &BridgeTransaction,
    supported_chains: &ChainWhitelist,
) -> Result<ValidTransaction, ValidationError> {
    validate_with_decimals(transaction, supported_chains, DEFAULT_TOKEN_DECIMALS)
}

pub fn validate_with_decimals(
    transaction: &BridgeTransaction,
    supported_chains: &ChainWhitelist,
    token_decimals: u32,
) -> Result<ValidTransaction, ValidationError> {
    let token = parse_address(&transaction.token)?;
    let amount = parse_amount(&transaction.amount, token_decimals)?;
    if !supported_chains.contains(transaction.target_chain_id) {
        return Err(ValidationError::UnsupportedChain(
            transaction.target_chain_id,
        ));
    }
    Ok(ValidTransaction {
        token,
        amount,
        target_chain_id: transaction.target_chain_id,
        data: transaction.data.clone(),
    })
}

/// Parse a 0x-prefixed, 20-byte hex address. Mixed-case input must carry a
/// valid EIP-55 checksum; all-lowercase or all-uppercase hex is accepted as is.
pub fn parse_address(address: &str) -> Result<EthAddress, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidAddress(format!("{address}: {reason}"));

    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| invalid("missing 0x prefix"))?;
    if hex.len() != ADDRESS_HEX_LEN {
        return Err(invalid("expected 20 bytes"));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("non-hex character"));
    }
    let parsed = EthAddress::from_str(hex).map_err(|e| invalid(&e.to_string()))?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&parsed, None) != address {
        return Err(invalid("bad EIP-55 checksum"));
    }
    Ok(parsed)
}

/// Parse a human-readable decimal amount into base units with exact
/// fixed-point arithmetic. The result must be strictly positive.
pub fn parse_amount(amount: &str, decimals: u32) -> Result<U256, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidAmount(format!("{amount:?}: {reason}"));

    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    if trimmed.starts_with('-') {
        return Err(invalid("must be positive"));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(invalid("not a decimal number"));
    }
    let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if fraction.len() > decimals as usize {
        return Err(invalid(&format!("more than {decimals} decimal places")));
    }
    // U256 holds 77 full decimal digits
    if integer.trim_start_matches('0').len() + decimals as usize > MAX_U256_DIGITS {
        return Err(invalid("too large"));
    }

    let units = parse_units(trimmed, decimals).map_err(|e| invalid(&e.to_string()))?;
    let base_units = match units {
        ParseUnits::U256(value) => value,
        ParseUnits::I256(_) => return Err(invalid("must be positive")),
    };
    if base_units.is_zero() {
        return Err(invalid("must be greater than zero"));
    }
    Ok(base_units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{USDC_POLYGON, USDC_POLYGON_LOWERCASE};

    fn whitelist() -> ChainWhitelist {
        ChainWhitelist::default()
    }

    #[test]
    fn test_valid_usdc_transfer_to_polygon() {
        let tx = BridgeTransaction::new(USDC_POLYGON, "100", 137);
        let valid = validate(&tx, &whitelist()).unwrap();
        assert_eq!(valid.token, EthAddress::from_str(USDC_POLYGON).unwrap());
        assert_eq!(
            valid.amount,
            U256::from(100u64) * U256::exp10(18)
        );
        assert_eq!(valid.target_chain_id, 137);
        assert!(valid.data.is_empty());
    }

    #[test]
    fn test_zero_amount_is_rejected() {
        let tx = BridgeTransaction::new(USDC_POLYGON, "0", 137);
        assert!(matches!(
            validate(&tx, &whitelist()),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_non_positive_and_garbage_amounts_are_rejected() {
        for amount in ["0", "0.0", "000", "-1", "-0.5", "", "  ", "abc", "1e18", "1,000", "0x10", "1.2.3"] {
            let tx = BridgeTransaction::new(USDC_POLYGON, amount, 137);
            assert!(
                matches!(
                    validate(&tx, &whitelist()),
                    Err(ValidationError::InvalidAmount(_))
                ),
                "amount {amount:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_fractional_amounts_are_exact() {
        assert_eq!(
            parse_amount("0.000000000000000001", 18).unwrap(),
            U256::one()
        );
        assert_eq!(
            parse_amount("1.5", 6).unwrap(),
            U256::from(1_500_000u64)
        );
        assert_eq!(
            parse_amount("0.1", 18).unwrap(),
            U256::from(100_000_000_000_000_000u64)
        );
        // Precision beyond the token decimals is an error, never silently truncated
        assert!(matches!(
            parse_amount("0.0000001", 6),
            Err(ValidationError::InvalidAmount(_))
        ));
        let huge = "9".repeat(60);
        assert!(matches!(
            parse_amount(&huge, 18),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_unsupported_chain_is_rejected() {
        let tx = BridgeTransaction::new(USDC_POLYGON, "100", 999999);
        assert_eq!(
            validate(&tx, &whitelist()),
            Err(ValidationError::UnsupportedChain(999999))
        );
        // Sepolia is a known chain but not in the default whitelist
        let tx = BridgeTransaction::new(USDC_POLYGON, "100", 11155111);
        assert_eq!(
            validate(&tx, &whitelist()),
            Err(ValidationError::UnsupportedChain(11155111))
        );
    }

    #[test]
    fn test_every_whitelisted_chain_passes() {
        let custom = ChainWhitelist::new([10, 42161]);
        for chain_id in custom.iter() {
            let tx = BridgeTransaction::new(USDC_POLYGON, "1", chain_id);
            assert!(validate(&tx, &custom).is_ok());
        }
        for chain_id in whitelist().iter() {
            let tx = BridgeTransaction::new(USDC_POLYGON, "1", chain_id);
            assert!(validate(&tx, &whitelist()).is_ok());
        }
    }

    #[test]
    fn test_malformed_addresses_are_rejected() {
        let malformed = [
            "",
            "0x",
            "2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
            "0x2791Bca1f2de4661ED88A30C99A7a9449Aa8417",
            "0x2791Bca1f2de4661ED88A30C99A7a9449Aa841744",
            "0x2791Bca1f2de4661ED88A30C99A7a9449Aa8417g",
            "0x2791bca1f2de4661ed88a30c99a7a9449aa8417 ",
            "0X2791bca1f2de4661ed88a30c99a7a9449aa84174",
            // checksum broken by flipping the case of one letter
            "0x2791bca1f2de4661ED88A30C99A7a9449Aa84174",
        ];
        for token in malformed {
            let tx = BridgeTransaction::new(token, "100", 137);
            assert!(
                matches!(
                    validate(&tx, &whitelist()),
                    Err(ValidationError::InvalidAddress(_))
                ),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_well_formed_addresses_pass() {
        let addresses = [
            USDC_POLYGON,
            USDC_POLYGON_LOWERCASE,
            "0x2791BCA1F2DE4661ED88A30C99A7A9449AA84174",
            // native-token sentinels
            "0x0000000000000000000000000000000000001010",
            "0x0000000000000000000000000000000000000000",
        ];
        for token in addresses {
            assert!(parse_address(token).is_ok(), "token {token:?} should pass");
        }
    }

    #[test]
    fn test_checks_run_in_order() {
        // Every field is wrong: the address is reported first
        let tx = BridgeTransaction::new("nope", "0", 999999);
        assert!(matches!(
            validate(&tx, &whitelist()),
            Err(ValidationError::InvalidAddress(_))
        ));
        // Address fixed: the amount is next
        let tx = BridgeTransaction::new(USDC_POLYGON, "0", 999999);
        assert!(matches!(
            validate(&tx, &whitelist()),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_data_is_passed_through() {
        let tx = BridgeTransaction::new(USDC_POLYGON, "1", 1).with_data(Bytes::from(vec![0xde, 0xad]));
        let valid = validate(&tx, &whitelist()).unwrap();
        assert_eq!(valid.data, Bytes::from(vec![0xde, 0xad]));
    }

    #[test]
    fn test_request_hash_at_matches_compute() {
        let valid = validate(&BridgeTransaction::new(USDC_POLYGON, "100", 137), &whitelist()).unwrap();
        assert_eq!(
            valid.request_hash_at(1_700_000_000),
            RequestHash::compute(valid.token, valid.amount, 137, &Bytes::default(), 1_700_000_000)
        );
        assert_ne!(valid.request_hash_at(1), valid.request_hash_at(2));
    }

    #[test]
    fn test_transaction_serde_uses_camel_case() {
        let json = serde_json::json!({
            "token": USDC_POLYGON,
            "amount": "100",
            "targetChainId": 137,
        });
        let tx: BridgeTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx, BridgeTransaction::new(USDC_POLYGON, "100", 137));
    }
}
