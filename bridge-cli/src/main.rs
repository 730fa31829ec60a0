// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use ai_bridge_agent::eth_client::EthBridgeClient;
use ai_bridge_agent::metered_eth_provider::{new_metered_eth_provider, MeteredEthHttpProvider};
use ai_bridge_agent::metrics::BridgeMetrics;
use ai_bridge_agent::telemetry::init_tracing;
use ai_bridge_agent::utils::{eth_address_of, MeteredEthSigner};
use ai_bridge_agent::BridgeDispatchService;
use ai_bridge_cli::{
    chain_catalog, generate_config_template_and_write_to_file, load_agent_config, AgentCommand,
    Args, LoadedAgentConfig, PRIVATE_KEY_ENV,
};
use anyhow::{anyhow, Context};
use clap::Parser;
use ethers::providers::Provider;
use serde::Serialize;
use std::sync::Arc;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn private_key() -> anyhow::Result<String> {
    std::env::var(PRIVATE_KEY_ENV).with_context(|| format!("{PRIVATE_KEY_ENV} is not set"))
}

async fn signing_service(
    loaded: &LoadedAgentConfig,
    metrics: Arc<BridgeMetrics>,
) -> anyhow::Result<BridgeDispatchService<EthBridgeClient<MeteredEthSigner>>> {
    let client = signing_client(loaded, metrics.clone()).await?;
    Ok(BridgeDispatchService::new(
        client,
        loaded.dispatch.clone(),
        metrics,
    ))
}

fn load(args: &Args) -> anyhow::Result<(LoadedAgentConfig, Arc<BridgeMetrics>)> {
    let config = load_agent_config(args.config_path.as_deref())?;
    let loaded = LoadedAgentConfig::new(config, &args.network)?;
    let registry = prometheus::Registry::new();
    let metrics = Arc::new(BridgeMetrics::new(&registry));
    tracing::debug!(
        "Using network {} (chain id {})",
        loaded.network.name,
        loaded.network.chain_id
    );
    Ok((loaded, metrics))
}

fn read_only_client(
    loaded: &LoadedAgentConfig,
    metrics: Arc<BridgeMetrics>,
) -> anyhow::Result<EthBridgeClient<Provider<MeteredEthHttpProvider>>> {
    let provider = new_metered_eth_provider(&loaded.network.rpc_url, metrics)
        .map_err(|e| anyhow!("Invalid rpc url {}: {e}", loaded.network.rpc_url))?;
    Ok(EthBridgeClient::new(
        loaded.bridge_contract()?,
        Arc::new(provider),
    ))
}

// Signs with the key in PRIVATE_KEY_ENV: the agent's for submissions, the owner's for admin calls
async fn signing_client(
    loaded: &LoadedAgentConfig,
    metrics: Arc<BridgeMetrics>,
) -> anyhow::Result<EthBridgeClient<MeteredEthSigner>> {
    EthBridgeClient::connect(
        &loaded.network.rpc_url,
        &private_key()?,
        loaded.bridge_contract()?,
        metrics,
    )
    .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    match &args.command {
        AgentCommand::CreateConfigTemplate { path } => {
            generate_config_template_and_write_to_file(path)?;
            println!("Agent config template written to {}", path.display());
        }
        AgentCommand::Validate(tx_args) => {
            let (loaded, _) = load(&args)?;
            let transaction = loaded.bridge_transaction(tx_args)?;
            let valid = ai_bridge_agent::transaction::validate_with_decimals(
                &transaction,
                &loaded.dispatch.supported_chains,
                loaded.dispatch.token_decimals,
            )?;
            print_json(&valid)?;
        }
        AgentCommand::EstimateGas(tx_args) => {
            let (loaded, metrics) = load(&args)?;
            let transaction = loaded.bridge_transaction(tx_args)?;
            let service = signing_service(&loaded, metrics).await?;
            let estimate = service.estimate_gas(&transaction).await?;
            print_json(&estimate)?;
        }
        AgentCommand::Initiate(tx_args) => {
            let (loaded, metrics) = load(&args)?;
            let transaction = loaded.bridge_transaction(tx_args)?;
            let service = signing_service(&loaded, metrics).await?;
            let submission = service.submit_bridge_transaction(&transaction).await?;
            print_json(&submission)?;
        }
        AgentCommand::Status { request_hash } => {
            // Read-only: no key needed
            let (loaded, metrics) = load(&args)?;
            let client = read_only_client(&loaded, metrics.clone())?;
            let service = BridgeDispatchService::new(client, loaded.dispatch.clone(), metrics);
            let status = service.request_status(Some(*request_hash)).await?;
            print_json(&serde_json::json!({
                "request_hash": request_hash,
                "status": status,
            }))?;
        }
        AgentCommand::ContractInfo { agent } => {
            let (loaded, metrics) = load(&args)?;
            let agent = match agent {
                Some(agent) => *agent,
                None => eth_address_of(&private_key()?)?,
            };
            let info = read_only_client(&loaded, metrics)?
                .contract_info(agent)
                .await?;
            print_json(&info)?;
        }
        AgentCommand::AuthorizeAgent { agent, revoke } => {
            let (loaded, metrics) = load(&args)?;
            let client = signing_client(&loaded, metrics).await?;
            let tx_hash = client.set_ai_agent_authorization(*agent, !revoke).await?;
            println!(
                "Agent {:?} {} in transaction {}",
                agent,
                if *revoke { "revoked" } else { "authorized" },
                tx_hash
            );
        }
        AgentCommand::UpdateBridgeInterface { new_interface } => {
            let (loaded, metrics) = load(&args)?;
            let client = signing_client(&loaded, metrics).await?;
            let tx_hash = client.update_bridge_interface(*new_interface).await?;
            println!(
                "Bridge interface set to {:?} in transaction {}",
                new_interface, tx_hash
            );
        }
        AgentCommand::Chains => {
            let (loaded, _) = load(&args)?;
            print_json(&chain_catalog(&loaded.dispatch))?;
        }
    }
    Ok(())
}
