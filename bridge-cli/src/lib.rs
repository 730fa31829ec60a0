// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use ai_bridge_agent::config::{BridgeAgentConfig, NetworkConfig};
use ai_bridge_agent::types::{resolve_chain_id, KnownChain, RequestHash};
use ai_bridge_agent::{BridgeTransaction, DispatchConfig};
use ai_bridge_config::Config;
use anyhow::{anyhow, Context};
use clap::*;
use ethers::types::{Address as EthAddress, Bytes};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Environment variable holding the hex private key used to sign.
pub const PRIVATE_KEY_ENV: &str = "BRIDGE_AGENT_PRIVATE_KEY";

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
#[clap(name = "ai-bridge-cli")]
pub struct Args {
    // Agent config file (YAML or JSON). Built-in defaults are used when absent.
    #[clap(long = "config-path", global = true)]
    pub config_path: Option<PathBuf>,
    // Network whose rpc url and bridge contract are used
    #[clap(long, global = true, default_value = "polygon")]
    pub network: String,
    #[clap(subcommand)]
    pub command: AgentCommand,
}

#[derive(clap::Args, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "kebab-case")]
pub struct TransactionArgs {
    // Token address, or a symbol from supported-tokens (e.g. USDC)
    #[clap(long)]
    pub token: String,
    // Human-readable amount, e.g. 1.5
    #[clap(long)]
    pub amount: String,
    // Destination chain, by name (polygon) or id (137)
    #[clap(long = "target-chain")]
    pub target_chain: String,
    // Optional 0x-prefixed payload forwarded to the bridge
    #[clap(long)]
    pub data: Option<String>,
}

#[derive(Subcommand)]
#[clap(rename_all = "kebab-case")]
pub enum AgentCommand {
    // Run the local checks on a bridge transaction
    #[clap(name = "validate")]
    Validate(TransactionArgs),
    // Estimate gas for initiateBridgeTransaction, with the configured buffer
    #[clap(name = "estimate-gas")]
    EstimateGas(TransactionArgs),
    // Submit a bridge transaction and wait for inclusion
    #[clap(name = "initiate")]
    Initiate(TransactionArgs),
    // Whether a bridge request has been processed
    #[clap(name = "status")]
    Status {
        #[clap(long = "request-hash")]
        request_hash: RequestHash,
    },
    // Owner only: grant or revoke an agent
    #[clap(name = "authorize-agent")]
    AuthorizeAgent {
        #[clap(long)]
        agent: EthAddress,
        #[clap(long, default_value = "false")]
        revoke: bool,
    },
    // Owner only: point the registry at a new bridge interface
    #[clap(name = "update-bridge-interface")]
    UpdateBridgeInterface {
        #[clap(long = "new-interface")]
        new_interface: EthAddress,
    },
    // Owner, bridge interface and agent authorization of the configured contract.
    // The agent defaults to the address of the signing key.
    #[clap(name = "contract-info")]
    ContractInfo {
        #[clap(long)]
        agent: Option<EthAddress>,
    },
    // Print the known chains and the configured whitelist
    #[clap(name = "chains")]
    Chains,
    #[clap(name = "create-config-template")]
    CreateConfigTemplate {
        #[clap(long)]
        path: PathBuf,
    },
}

/// Loads the config file if given, applies environment overrides and
/// validates the result.
pub fn load_agent_config(path: Option<&Path>) -> anyhow::Result<BridgeAgentConfig> {
    let mut config = match path {
        Some(path) => BridgeAgentConfig::load(path)?,
        None => {
            info!("No --config-path given, using built-in defaults");
            BridgeAgentConfig::default()
        }
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

pub fn generate_config_template_and_write_to_file(path: &Path) -> anyhow::Result<()> {
    BridgeAgentConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write config template to {}", path.display()))
}

pub struct LoadedAgentConfig {
    pub config: BridgeAgentConfig,
    pub network: NetworkConfig,
    pub dispatch: DispatchConfig,
}

impl LoadedAgentConfig {
    pub fn new(config: BridgeAgentConfig, network: &str) -> anyhow::Result<Self> {
        let network = config
            .network(network)
            .cloned()
            .ok_or_else(|| anyhow!("Network {network} is not configured"))?;
        let dispatch = config.dispatch_config()?;
        Ok(Self {
            config,
            network,
            dispatch,
        })
    }

    pub fn bridge_contract(&self) -> anyhow::Result<EthAddress> {
        Ok(self.config.bridge_contract(&self.network.name)?)
    }

    /// Turns command line arguments into a bridge transaction. Token
    /// symbols resolve on the selected network; unknown chain names fail
    /// here, while unlisted chain ids are left for validation to reject.
    pub fn bridge_transaction(&self, args: &TransactionArgs) -> anyhow::Result<BridgeTransaction> {
        let token = self
            .config
            .resolve_token(&args.token, &self.network.name)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown token {} on {}",
                    args.token,
                    self.network.name
                )
            })?;
        let target_chain_id = resolve_chain_id(&args.target_chain)
            .ok_or_else(|| anyhow!("Unknown target chain {}", args.target_chain))?;
        let data = match &args.data {
            Some(hex) => Bytes::from_str(hex).map_err(|e| anyhow!("Invalid --data: {e}"))?,
            None => Bytes::default(),
        };
        Ok(BridgeTransaction::new(token, args.amount.as_str(), target_chain_id).with_data(data))
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChainEntry {
    pub name: &'static str,
    pub chain_id: u64,
    pub whitelisted: bool,
}

/// Every known chain followed by whitelisted ids that have no name.
pub fn chain_catalog(dispatch: &DispatchConfig) -> Vec<ChainEntry> {
    let mut entries = KnownChain::ALL
        .into_iter()
        .map(|chain| ChainEntry {
            name: chain.name(),
            chain_id: chain.chain_id(),
            whitelisted: dispatch.supported_chains.contains(chain.chain_id()),
        })
        .collect::<Vec<_>>();
    entries.extend(
        dispatch
            .supported_chains
            .iter()
            .filter(|id| KnownChain::from_chain_id(*id).is_none())
            .map(|chain_id| ChainEntry {
                name: "unnamed",
                chain_id,
                whitelisted: true,
            }),
    );
    entries
}
