// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::metered_eth_provider::{new_metered_eth_provider, MeteredEthHttpProvider};
use crate::metrics::BridgeMetrics;
use anyhow::{anyhow, Context};
use ethers::core::k256::ecdsa::SigningKey;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{JsonRpcClient, Middleware, Provider};
use ethers::signers::{Signer, Wallet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub type MeteredEthSigner = SignerMiddleware<Provider<MeteredEthHttpProvider>, Wallet<SigningKey>>;

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

fn parse_wallet(private_key_hex: &str) -> anyhow::Result<Wallet<SigningKey>> {
    Wallet::from_str(private_key_hex.trim_start_matches("0x"))
        .map_err(|e| anyhow!("Invalid private key: {e}"))
}

async fn sign_with_chain_id<P: JsonRpcClient + 'static>(
    provider: Provider<P>,
    private_key_hex: &str,
) -> anyhow::Result<SignerMiddleware<Provider<P>, Wallet<SigningKey>>> {
    let provider = provider.interval(RECEIPT_POLL_INTERVAL);
    let chain_id = provider
        .get_chainid()
        .await
        .context("Failed to query chain id")?;
    let wallet = parse_wallet(private_key_hex)?.with_chain_id(chain_id.as_u64());
    Ok(SignerMiddleware::new(provider, wallet))
}

pub async fn get_metered_eth_signer_client(
    url: &str,
    private_key_hex: &str,
    metrics: Arc<BridgeMetrics>,
) -> anyhow::Result<MeteredEthSigner> {
    let provider =
        new_metered_eth_provider(url, metrics).with_context(|| format!("Invalid rpc url {url}"))?;
    sign_with_chain_id(provider, private_key_hex).await
}

/// Address controlled by a hex private key, without touching the network.
pub fn eth_address_of(private_key_hex: &str) -> anyhow::Result<ethers::types::Address> {
    Ok(parse_wallet(private_key_hex)?.address())
}
