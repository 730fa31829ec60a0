// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Action labels produced by the intent classifier, and the interfaces of
//! the external services the agent orchestrator talks to.

use crate::types::{KnownChain, RequestHash};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the orchestrator will actually do for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentAction {
    Ask,
    Transact,
    GenerateCode,
    GetBalance,
    GetTransactions,
    GetNfts,
    GetNftFloorPrice,
    GetGasFees,
    GetGasSpending,
    GetTokenPrice,
    GetSwapRate,
}

impl AgentAction {
    pub const ALL: [AgentAction; 11] = [
        AgentAction::Ask,
        AgentAction::Transact,
        AgentAction::GenerateCode,
        AgentAction::GetBalance,
        AgentAction::GetTransactions,
        AgentAction::GetNfts,
        AgentAction::GetNftFloorPrice,
        AgentAction::GetGasFees,
        AgentAction::GetGasSpending,
        AgentAction::GetTokenPrice,
        AgentAction::GetSwapRate,
    ];

    /// The label the classifier is prompted to answer with.
    pub fn label(&self) -> &'static str {
        match self {
            AgentAction::Ask => "ask",
            AgentAction::Transact => "transact",
            AgentAction::GenerateCode => "generateCode",
            AgentAction::GetBalance => "getBalance",
            AgentAction::GetTransactions => "getTransactions",
            AgentAction::GetNfts => "getNFTs",
            AgentAction::GetNftFloorPrice => "getNFTFloorPrice",
            AgentAction::GetGasFees => "getGasFees",
            AgentAction::GetGasSpending => "getGasSpending",
            AgentAction::GetTokenPrice => "getTokenPrice",
            AgentAction::GetSwapRate => "getSwapRate",
        }
    }
}

/// Classifier output. Anything outside the known label set is kept
/// verbatim as `Unrecognized` and routed to [`AgentAction::Ask`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionLabel {
    Ask,
    Transact,
    GenerateCode,
    GetBalance,
    GetTransactions,
    GetNfts,
    GetNftFloorPrice,
    GetGasFees,
    GetGasSpending,
    GetTokenPrice,
    GetSwapRate,
    Unrecognized(String),
}

impl ActionLabel {
    pub fn parse(raw: &str) -> Self {
        // Models sometimes wrap the label in quotes or add a trailing period
        let cleaned = raw
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.');
        let found = AgentAction::ALL
            .into_iter()
            .find(|action| action.label().eq_ignore_ascii_case(cleaned));
        match found {
            Some(action) => Self::from(action),
            None => ActionLabel::Unrecognized(raw.to_string()),
        }
    }

    pub fn route(&self) -> AgentAction {
        match self {
            ActionLabel::Ask => AgentAction::Ask,
            ActionLabel::Transact => AgentAction::Transact,
            ActionLabel::GenerateCode => AgentAction::GenerateCode,
            ActionLabel::GetBalance => AgentAction::GetBalance,
            ActionLabel::GetTransactions => AgentAction::GetTransactions,
            ActionLabel::GetNfts => AgentAction::GetNfts,
            ActionLabel::GetNftFloorPrice => AgentAction::GetNftFloorPrice,
            ActionLabel::GetGasFees => AgentAction::GetGasFees,
            ActionLabel::GetGasSpending => AgentAction::GetGasSpending,
            ActionLabel::GetTokenPrice => AgentAction::GetTokenPrice,
            ActionLabel::GetSwapRate => AgentAction::GetSwapRate,
            ActionLabel::Unrecognized(_) => AgentAction::Ask,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ActionLabel::Unrecognized(_))
    }
}

impl From<AgentAction> for ActionLabel {
    fn from(action: AgentAction) -> Self {
        match action {
            AgentAction::Ask => ActionLabel::Ask,
            AgentAction::Transact => ActionLabel::Transact,
            AgentAction::GenerateCode => ActionLabel::GenerateCode,
            AgentAction::GetBalance => ActionLabel::GetBalance,
            AgentAction::GetTransactions => ActionLabel::GetTransactions,
            AgentAction::GetNfts => ActionLabel::GetNfts,
            AgentAction::GetNftFloorPrice => ActionLabel::GetNftFloorPrice,
            AgentAction::GetGasFees => ActionLabel::GetGasFees,
            AgentAction::GetGasSpending => ActionLabel::GetGasSpending,
            AgentAction::GetTokenPrice => ActionLabel::GetTokenPrice,
            AgentAction::GetSwapRate => ActionLabel::GetSwapRate,
        }
    }
}

impl FromStr for ActionLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionLabel::Unrecognized(raw) => write!(f, "{raw}"),
            known => write!(f, "{}", known.route().label()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskAnswer {
    pub answer: String,
}

/// Parameters the assistant pulled out of a free-form request. Every field
/// is optional: the assistant fills in what it found.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedIntent {
    pub action: Option<String>,
    pub token1: Option<String>,
    pub token2: Option<String>,
    pub amount: Option<String>,
    pub chain: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContract {
    pub contract: String,
    pub abi: serde_json::Value,
    pub bytecode: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStep {
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftItem {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorPrice {
    pub floor_price: f64,
    pub price_currency: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub price: String,
    pub price_impact: Option<String>,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, input: &str) -> anyhow::Result<ActionLabel>;
}

#[async_trait]
pub trait AiAssistant: Send + Sync {
    async fn ask(&self, prompt: &str) -> anyhow::Result<AskAnswer>;

    async fn extract(&self, prompt: &str) -> anyhow::Result<ExtractedIntent>;

    async fn generate_code(&self, prompt: &str) -> anyhow::Result<GeneratedContract>;

    /// Builds the transaction(s) that would carry out `prompt` for `address`.
    async fn transact(&self, prompt: &str, address: &str) -> anyhow::Result<Vec<TransactionStep>>;

    async fn explain_decision(&self, request_hash: RequestHash) -> anyhow::Result<String>;
}

/// Read-only chain data: balances are returned already formatted in the
/// chain's native unit.
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    async fn balance(&self, address: &str, network: KnownChain) -> anyhow::Result<String>;

    async fn transactions(
        &self,
        address: &str,
        network: KnownChain,
    ) -> anyhow::Result<Vec<TransactionRecord>>;

    async fn nfts(&self, address: &str) -> anyhow::Result<Vec<NftItem>>;

    async fn nft_floor_price(&self, contract: &str) -> anyhow::Result<Option<FloorPrice>>;

    async fn gas_fees(&self) -> anyhow::Result<String>;

    async fn gas_spending(&self, address: &str) -> anyhow::Result<String>;

    async fn token_price(&self, address: &str, network: KnownChain) -> anyhow::Result<String>;
}

#[async_trait]
pub trait SwapQuoteProvider: Send + Sync {
    async fn quote(&self, from_token: &str, to_token: &str, amount: &str) -> anyhow::Result<SwapQuote>;
}
