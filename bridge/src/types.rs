// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use ethers::abi::{encode, Token};
use ethers::types::{Address as EthAddress, Bytes, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Chains accepted as bridge targets when nothing else is configured:
/// Ethereum, Polygon and Polygon Amoy.
pub const DEFAULT_SUPPORTED_CHAINS: [u64; 3] = [1, 137, 80002];

/// Decimals used to turn human-readable amounts into base units (ether-style).
pub const DEFAULT_TOKEN_DECIMALS: u32 = 18;

/// Multiplier applied on top of the node's gas estimate.
pub const DEFAULT_GAS_BUFFER: f64 = 1.2;

const BASIS_POINTS: u64 = 10_000;

/// Content address of a logical bridge request, as computed by the registry
/// contract. This is the on-chain dedup key and the key of the processed flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestHash(H256);

/// Native hash of the chain transaction that carried a submission.
/// Identifies the submission, never the logical request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionHash(H256);

impl RequestHash {
    pub fn new(hash: H256) -> Self {
        Self(hash)
    }

    /// keccak256(abi.encode(token, amount, targetChainId, data, timestamp))
    pub fn compute(
        token: EthAddress,
        amount: U256,
        target_chain_id: u64,
        data: &Bytes,
        timestamp: u64,
    ) -> Self {
        let encoded = encode(&[
            Token::Address(token),
            Token::Uint(amount),
            Token::Uint(U256::from(target_chain_id)),
            Token::Bytes(data.to_vec()),
            Token::Uint(U256::from(timestamp)),
        ]);
        Self(H256::from(keccak256(encoded)))
    }

    pub fn as_h256(&self) -> H256 {
        self.0
    }

    pub fn to_fixed_bytes(self) -> [u8; 32] {
        self.0.to_fixed_bytes()
    }
}

impl SubmissionHash {
    pub fn new(hash: H256) -> Self {
        Self(hash)
    }

    pub fn as_h256(&self) -> H256 {
        self.0
    }
}

impl From<[u8; 32]> for RequestHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(H256::from(bytes))
    }
}

fn parse_h256(s: &str) -> Result<H256, String> {
    let hex = s
        .strip_prefix("0x")
        .ok_or_else(|| format!("hash must be 0x-prefixed: {s}"))?;
    if hex.len() != 64 {
        return Err(format!("hash must be 32 bytes: {s}"));
    }
    H256::from_str(hex).map_err(|e| format!("invalid hash {s}: {e}"))
}

impl FromStr for RequestHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_h256(s).map(Self)
    }
}

impl FromStr for SubmissionHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_h256(s).map(Self)
    }
}

impl fmt::Display for RequestHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Display for SubmissionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Networks the agent knows by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownChain {
    Ethereum,
    Sepolia,
    Polygon,
    Amoy,
}

impl KnownChain {
    pub const ALL: [KnownChain; 4] = [
        KnownChain::Ethereum,
        KnownChain::Sepolia,
        KnownChain::Polygon,
        KnownChain::Amoy,
    ];

    pub fn chain_id(&self) -> u64 {
        match self {
            KnownChain::Ethereum => 1,
            KnownChain::Sepolia => 11155111,
            KnownChain::Polygon => 137,
            KnownChain::Amoy => 80002,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KnownChain::Ethereum => "ethereum",
            KnownChain::Sepolia => "sepolia",
            KnownChain::Polygon => "polygon",
            KnownChain::Amoy => "amoy",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.chain_id() == chain_id)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == lower)
    }
}

impl fmt::Display for KnownChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.chain_id())
    }
}

/// Resolve a chain given either as a decimal id or as a known network name.
pub fn resolve_chain_id(chain: &str) -> Option<u64> {
    if let Ok(id) = chain.trim().parse::<u64>() {
        return Some(id);
    }
    KnownChain::from_name(chain).map(|c| c.chain_id())
}

/// Fixed set of chain ids a bridge request may target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainWhitelist(BTreeSet<u64>);

impl ChainWhitelist {
    pub fn new(chain_ids: impl IntoIterator<Item = u64>) -> Self {
        Self(chain_ids.into_iter().collect())
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.0.contains(&chain_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }
}

impl Default for ChainWhitelist {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORTED_CHAINS)
    }
}

/// Gas multiplier stored as integer basis points so that applying it to a
/// `U256` never goes through floating point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasBuffer {
    basis_points: u64,
}

impl GasBuffer {
    pub fn from_multiplier(multiplier: f64) -> Option<Self> {
        if !multiplier.is_finite() || multiplier < 1.0 || multiplier > 100.0 {
            return None;
        }
        Some(Self {
            basis_points: (multiplier * BASIS_POINTS as f64).round() as u64,
        })
    }

    pub fn basis_points(&self) -> u64 {
        self.basis_points
    }

    /// ceil(gas * multiplier)
    pub fn apply(&self, gas: U256) -> U256 {
        let scaled = gas.saturating_mul(U256::from(self.basis_points));
        let (quotient, remainder) = scaled.div_mod(U256::from(BASIS_POINTS));
        if remainder.is_zero() {
            quotient
        } else {
            quotient.saturating_add(U256::one())
        }
    }
}

impl Default for GasBuffer {
    fn default() -> Self {
        Self {
            basis_points: 12_000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    /// Gas units reported by the node for the simulated call
    pub estimated: U256,
    /// Estimate with the configured buffer applied; used as the gas limit on submission
    pub gas_limit: U256,
}

/// Lifecycle of one logical bridge request as observed by the dispatch service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeRequestStatus {
    Unsubmitted,
    StillPending,
    Processed,
}

/// Result of a successful submission: both identifiers, kept apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSubmission {
    pub submission_hash: SubmissionHash,
    pub request_hash: RequestHash,
}
