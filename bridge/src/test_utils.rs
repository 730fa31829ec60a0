// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::dispatch::{BridgeDispatchService, DispatchConfig};
use crate::intent::{
    ActionLabel, AiAssistant, AskAnswer, ChainDataProvider, ExtractedIntent, FloorPrice,
    GeneratedContract, IntentClassifier, NftItem, SwapQuote, SwapQuoteProvider, TransactionRecord,
    TransactionStep,
};
use crate::metrics::BridgeMetrics;
use crate::simulated::SimulatedBridgeContract;
use crate::transaction::{BridgeTransaction, ValidTransaction};
use crate::types::{KnownChain, RequestHash};
use async_trait::async_trait;
use ethers::types::{Address as EthAddress, Bytes, U256};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub use crate::telemetry::init_for_testing;

/// USDC (PoS) on Polygon, EIP-55 checksummed.
pub const USDC_POLYGON: &str = "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174";
pub const USDC_POLYGON_LOWERCASE: &str = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174";

pub const TEST_GENESIS_TIMESTAMP: u64 = 1_700_000_000;

pub struct TestAccounts {
    pub owner: EthAddress,
    pub agent: EthAddress,
    pub user: EthAddress,
    pub bridge_interface: EthAddress,
}

pub fn test_accounts() -> TestAccounts {
    TestAccounts {
        owner: EthAddress::repeat_byte(0x0a),
        agent: EthAddress::repeat_byte(0x0b),
        user: EthAddress::repeat_byte(0x0c),
        bridge_interface: EthAddress::repeat_byte(0x0d),
    }
}

/// 100 USDC (18-decimal precision) to Polygon with no payload.
pub fn test_valid_transaction() -> ValidTransaction {
    ValidTransaction {
        token: EthAddress::from_str(USDC_POLYGON).unwrap(),
        amount: U256::exp10(20),
        target_chain_id: 137,
        data: Bytes::default(),
    }
}

pub fn usdc_transaction(amount: &str, target_chain_id: u64) -> BridgeTransaction {
    BridgeTransaction::new(USDC_POLYGON, amount, target_chain_id)
}

/// A freshly deployed registry with the test agent authorized, and a
/// dispatch service sending from the agent account.
pub struct SimulatedSetup {
    /// Owner handle
    pub chain: SimulatedBridgeContract,
    pub service: Arc<BridgeDispatchService<SimulatedBridgeContract>>,
    pub metrics: Arc<BridgeMetrics>,
    bridge_interface: SimulatedBridgeContract,
}

impl SimulatedSetup {
    /// Marks a request processed the way the bridge interface would.
    pub async fn settle(&self, request_hash: RequestHash) {
        self.bridge_interface
            .complete_bridge_transaction(request_hash)
            .await
            .unwrap();
    }
}

pub async fn simulated_setup() -> SimulatedSetup {
    simulated_setup_with_config(DispatchConfig::default()).await
}

pub async fn simulated_setup_with_config(config: DispatchConfig) -> SimulatedSetup {
    let accounts = test_accounts();
    let chain = SimulatedBridgeContract::deploy(
        accounts.owner,
        accounts.bridge_interface,
        TEST_GENESIS_TIMESTAMP,
    );
    chain
        .set_ai_agent_authorization(accounts.agent, true)
        .await
        .unwrap();
    let metrics = Arc::new(BridgeMetrics::new_for_testing());
    let service = Arc::new(BridgeDispatchService::new(
        chain.connect(accounts.agent),
        config,
        metrics.clone(),
    ));
    SimulatedSetup {
        bridge_interface: chain.connect(accounts.bridge_interface),
        chain,
        service,
        metrics,
    }
}

/// Classifier that answers every request with the same label, or fails.
pub struct StubClassifier {
    label: Option<ActionLabel>,
}

impl StubClassifier {
    pub fn always(label: ActionLabel) -> Self {
        Self { label: Some(label) }
    }

    pub fn failing() -> Self {
        Self { label: None }
    }
}

#[async_trait]
impl IntentClassifier for StubClassifier {
    async fn classify(&self, _input: &str) -> anyhow::Result<ActionLabel> {
        self.label
            .clone()
            .ok_or_else(|| anyhow::anyhow!("classifier unavailable"))
    }
}

#[derive(Default)]
pub struct StubAssistant {
    pub extracted: ExtractedIntent,
    pub transaction_steps: Vec<TransactionStep>,
}

#[async_trait]
impl AiAssistant for StubAssistant {
    async fn ask(&self, prompt: &str) -> anyhow::Result<AskAnswer> {
        Ok(AskAnswer {
            answer: format!("answer to: {prompt}"),
        })
    }

    async fn extract(&self, _prompt: &str) -> anyhow::Result<ExtractedIntent> {
        Ok(self.extracted.clone())
    }

    async fn generate_code(&self, _prompt: &str) -> anyhow::Result<GeneratedContract> {
        Ok(GeneratedContract {
            contract: "pragma solidity ^0.8.0;\ncontract Token {}".to_string(),
            abi: serde_json::json!([]),
            bytecode: "0x".to_string(),
        })
    }

    async fn transact(&self, _prompt: &str, _address: &str) -> anyhow::Result<Vec<TransactionStep>> {
        Ok(self.transaction_steps.clone())
    }

    async fn explain_decision(&self, request_hash: RequestHash) -> anyhow::Result<String> {
        Ok(format!("explanation for {request_hash}"))
    }
}

/// Fixed chain data: 0.75 ETH and 12.5 MATIC, two transactions.
#[derive(Default)]
pub struct StubChainData {
    pub nfts: Vec<NftItem>,
    pub floor_price: Option<FloorPrice>,
    pub floor_price_queries: Mutex<Vec<String>>,
}

impl StubChainData {
    pub fn last_floor_price_query(&self) -> Option<String> {
        self.floor_price_queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChainDataProvider for StubChainData {
    async fn balance(&self, _address: &str, network: KnownChain) -> anyhow::Result<String> {
        Ok(match network {
            KnownChain::Polygon => "12.5",
            _ => "0.75",
        }
        .to_string())
    }

    async fn transactions(
        &self,
        _address: &str,
        _network: KnownChain,
    ) -> anyhow::Result<Vec<TransactionRecord>> {
        Ok(vec![
            TransactionRecord {
                hash: "0xaaa".into(),
            },
            TransactionRecord {
                hash: "0xbbb".into(),
            },
        ])
    }

    async fn nfts(&self, _address: &str) -> anyhow::Result<Vec<NftItem>> {
        Ok(self.nfts.clone())
    }

    async fn nft_floor_price(&self, contract: &str) -> anyhow::Result<Option<FloorPrice>> {
        self.floor_price_queries
            .lock()
            .unwrap()
            .push(contract.to_string());
        Ok(self.floor_price.clone())
    }

    async fn gas_fees(&self) -> anyhow::Result<String> {
        Ok("30 gwei".to_string())
    }

    async fn gas_spending(&self, _address: &str) -> anyhow::Result<String> {
        Ok("0.01 ETH".to_string())
    }

    async fn token_price(&self, _address: &str, _network: KnownChain) -> anyhow::Result<String> {
        Ok("$1.00".to_string())
    }
}

#[derive(Default)]
pub struct StubSwaps;

#[async_trait]
impl SwapQuoteProvider for StubSwaps {
    async fn quote(&self, _from: &str, _to: &str, _amount: &str) -> anyhow::Result<SwapQuote> {
        Ok(SwapQuote {
            price: "0.0004".to_string(),
            price_impact: None,
        })
    }
}
