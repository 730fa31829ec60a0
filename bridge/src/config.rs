// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::dispatch::DispatchConfig;
use crate::error::BridgeError;
use crate::transaction::{parse_address, MAX_U256_DIGITS};
use crate::types::{
    ChainWhitelist, GasBuffer, DEFAULT_GAS_BUFFER, DEFAULT_SUPPORTED_CHAINS,
    DEFAULT_TOKEN_DECIMALS,
};
use ai_bridge_config::Config;
use ethers::types::Address as EthAddress;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;
use url::Url;

pub const POLYGON_NETWORK: &str = "polygon";
pub const AMOY_NETWORK: &str = "amoy";

const POLYGON_RPC_URL_ENV: &str = "POLYGON_RPC_URL";
const AMOY_RPC_URL_ENV: &str = "AMOY_RPC_URL";
const POLYGON_BRIDGE_CONTRACT_ENV: &str = "BRIDGE_CONTRACT_ADDRESS";
const AMOY_BRIDGE_CONTRACT_ENV: &str = "AMOY_BRIDGE_CONTRACT_ADDRESS";

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    // JSON-RPC endpoint of a full node
    pub rpc_url: String,
    // Deployed AIBridgeAgent contract, if any on this network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_contract_address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeAgentConfig {
    pub networks: Vec<NetworkConfig>,
    #[serde(default = "default_supported_chains")]
    pub supported_chains: Vec<u64>,
    // Multiplier applied to every gas estimate
    #[serde(default = "default_min_gas_buffer")]
    pub min_gas_buffer: f64,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
    // Symbol -> network name -> token address
    #[serde(default = "default_supported_tokens")]
    pub supported_tokens: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_supported_chains() -> Vec<u64> {
    DEFAULT_SUPPORTED_CHAINS.to_vec()
}

fn default_min_gas_buffer() -> f64 {
    DEFAULT_GAS_BUFFER
}

fn default_token_decimals() -> u32 {
    DEFAULT_TOKEN_DECIMALS
}

fn default_supported_tokens() -> BTreeMap<String, BTreeMap<String, String>> {
    let per_network = |polygon: &str, amoy: &str| {
        BTreeMap::from([
            (POLYGON_NETWORK.to_string(), polygon.to_string()),
            (AMOY_NETWORK.to_string(), amoy.to_string()),
        ])
    };
    BTreeMap::from([
        (
            "MATIC".to_string(),
            per_network(
                "0x0000000000000000000000000000000000001010",
                "0x0000000000000000000000000000000000001010",
            ),
        ),
        (
            "USDC".to_string(),
            per_network(
                "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174",
                "0xe11A86849d99F524cAC3E7A0Ec1241828e332C62",
            ),
        ),
    ])
}

impl Default for BridgeAgentConfig {
    fn default() -> Self {
        Self {
            networks: vec![
                NetworkConfig {
                    name: POLYGON_NETWORK.to_string(),
                    chain_id: 137,
                    rpc_url: "https://polygon-rpc.com".to_string(),
                    bridge_contract_address: None,
                },
                NetworkConfig {
                    name: AMOY_NETWORK.to_string(),
                    chain_id: 80002,
                    rpc_url: "https://polygon-amoy.drpc.org".to_string(),
                    bridge_contract_address: None,
                },
            ],
            supported_chains: default_supported_chains(),
            min_gas_buffer: default_min_gas_buffer(),
            token_decimals: default_token_decimals(),
            supported_tokens: default_supported_tokens(),
        }
    }
}

impl Config for BridgeAgentConfig {}

impl BridgeAgentConfig {
    /// Overrides rpc urls and contract addresses from the process
    /// environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let overrides = [
            (POLYGON_NETWORK, POLYGON_RPC_URL_ENV, POLYGON_BRIDGE_CONTRACT_ENV),
            (AMOY_NETWORK, AMOY_RPC_URL_ENV, AMOY_BRIDGE_CONTRACT_ENV),
        ];
        for (network, rpc_env, contract_env) in overrides {
            let Some(config) = self.networks.iter_mut().find(|n| n.name == network) else {
                continue;
            };
            if let Some(rpc_url) = lookup(rpc_env).filter(|v| !v.is_empty()) {
                info!("Using {} for {} rpc url", rpc_env, network);
                config.rpc_url = rpc_url;
            }
            if let Some(address) = lookup(contract_env).filter(|v| !v.is_empty()) {
                info!("Using {} for {} bridge contract", contract_env, network);
                config.bridge_contract_address = Some(address);
            }
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.supported_chains.is_empty() {
            return Err(invalid("supported-chains must not be empty"));
        }
        GasBuffer::from_multiplier(self.min_gas_buffer).ok_or_else(|| {
            invalid(format!(
                "min-gas-buffer must be a finite multiplier >= 1.0, got {}",
                self.min_gas_buffer
            ))
        })?;
        if self.token_decimals as usize > MAX_U256_DIGITS {
            return Err(invalid(format!(
                "token-decimals must be at most {MAX_U256_DIGITS}, got {}",
                self.token_decimals
            )));
        }
        for network in &self.networks {
            let url = Url::parse(&network.rpc_url).map_err(|e| {
                invalid(format!("network {}: invalid rpc-url: {e}", network.name))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(format!(
                    "network {}: rpc-url must be http(s), got {}",
                    network.name,
                    url.scheme()
                )));
            }
            if let Some(address) = &network.bridge_contract_address {
                parse_address(address).map_err(|e| {
                    invalid(format!("network {}: bridge-contract-address: {e}", network.name))
                })?;
            }
        }
        for (symbol, addresses) in &self.supported_tokens {
            for (network, address) in addresses {
                parse_address(address).map_err(|e| {
                    invalid(format!("token {symbol} on {network}: {e}"))
                })?;
            }
        }
        Ok(())
    }

    /// Policy for the dispatch service. Fails on the same buffer check as
    /// [`Self::validate`].
    pub fn dispatch_config(&self) -> Result<DispatchConfig, BridgeError> {
        let gas_buffer = GasBuffer::from_multiplier(self.min_gas_buffer).ok_or_else(|| {
            invalid(format!("min-gas-buffer {} is not usable", self.min_gas_buffer))
        })?;
        Ok(DispatchConfig {
            supported_chains: ChainWhitelist::new(self.supported_chains.iter().copied()),
            gas_buffer,
            token_decimals: self.token_decimals,
        })
    }

    pub fn network(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }

    /// Address of the bridge contract on `network`, failing when the
    /// network is unknown or has no deployment configured.
    pub fn bridge_contract(&self, network: &str) -> Result<EthAddress, BridgeError> {
        let config = self
            .network(network)
            .ok_or_else(|| invalid(format!("unknown network {network}")))?;
        let address = config
            .bridge_contract_address
            .as_deref()
            .ok_or_else(|| invalid(format!("no bridge contract configured for {network}")))?;
        parse_address(address).map_err(|e| invalid(e.to_string()))
    }

    /// Resolves a token given either as an address or as a configured
    /// symbol (case-insensitive) on `network`.
    pub fn resolve_token(&self, token: &str, network: &str) -> Option<String> {
        if token.starts_with("0x") {
            return Some(token.to_string());
        }
        self.supported_tokens
            .iter()
            .find(|(symbol, _)| symbol.eq_ignore_ascii_case(token))
            .and_then(|(_, addresses)| addresses.get(&network.to_lowercase()))
            .cloned()
    }
}

fn invalid(msg: impl Into<String>) -> BridgeError {
    BridgeError::InvalidConfig(msg.into())
}
