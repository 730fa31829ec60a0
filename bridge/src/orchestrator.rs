// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Turns a user's free-form request into one action, runs it against the
//! right collaborator and phrases the result for the chat transcript.

use crate::contract::BridgeContract;
use crate::dispatch::BridgeDispatchService;
use crate::error::{BridgeError, ValidationError};
use crate::intent::{
    AgentAction, AiAssistant, ChainDataProvider, ExtractedIntent, IntentClassifier,
    SwapQuoteProvider,
};
use crate::transaction::{parse_address, BridgeTransaction};
use crate::types::{resolve_chain_id, GasEstimate, KnownChain, RequestHash};
use anyhow::anyhow;
use ethers::types::Bytes;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Collection queried for a floor price when the request names none (BAYC).
pub const DEFAULT_NFT_CONTRACT: &str = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";

const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't complete that request right now. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Ask,
    Transaction,
    Code,
    Balance,
    Transactions,
    Nfts,
    NftPrice,
    GasFees,
    GasSpending,
    TokenPrice,
    SwapRate,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,
    pub kind: ResponseKind,
}

impl AgentResponse {
    fn new(kind: ResponseKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Transaction not yet processed: {0}")]
    NotYetProcessed(RequestHash),
    #[error("Could not extract {0} from the request")]
    IncompleteIntent(&'static str),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub struct AgentOrchestrator<C> {
    classifier: Arc<dyn IntentClassifier>,
    assistant: Arc<dyn AiAssistant>,
    chain_data: Arc<dyn ChainDataProvider>,
    swaps: Arc<dyn SwapQuoteProvider>,
    dispatch: Arc<BridgeDispatchService<C>>,
}

impl<C: BridgeContract> AgentOrchestrator<C> {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        assistant: Arc<dyn AiAssistant>,
        chain_data: Arc<dyn ChainDataProvider>,
        swaps: Arc<dyn SwapQuoteProvider>,
        dispatch: Arc<BridgeDispatchService<C>>,
    ) -> Self {
        Self {
            classifier,
            assistant,
            chain_data,
            swaps,
            dispatch,
        }
    }

    pub fn dispatch(&self) -> &Arc<BridgeDispatchService<C>> {
        &self.dispatch
    }

    /// Never fails: any collaborator error becomes a `ResponseKind::Error`
    /// reply, and the cause is logged.
    pub async fn process_user_request(&self, input: &str, address: &str) -> AgentResponse {
        match self.handle(input, address).await {
            Ok(response) => response,
            Err(e) => {
                let error_type = match &e {
                    AgentError::Bridge(b) => b.error_type(),
                    AgentError::NotYetProcessed(_) => "not_yet_processed",
                    AgentError::IncompleteIntent(_) => "incomplete_intent",
                    AgentError::Collaborator(_) => "collaborator",
                };
                error!(error_type, "Error processing request: {:#}", e);
                AgentResponse::new(ResponseKind::Error, GENERIC_FAILURE_MESSAGE)
            }
        }
    }

    async fn handle(&self, input: &str, address: &str) -> Result<AgentResponse, AgentError> {
        let label = self.classifier.classify(input).await?;
        let action = label.route();
        if !label.is_recognized() {
            info!("Unrecognized action label {:?}, answering as a question", label.to_string());
        }
        let response = match action {
            AgentAction::GetBalance => self.balance(input, address).await?,
            AgentAction::GetGasFees => {
                let fees = self.chain_data.gas_fees().await?;
                AgentResponse::new(ResponseKind::GasFees, format!("Current gas fees: {fees}"))
            }
            AgentAction::GetGasSpending => {
                let spending = self.chain_data.gas_spending(address).await?;
                AgentResponse::new(
                    ResponseKind::GasSpending,
                    format!("Your gas spending: {spending}"),
                )
            }
            AgentAction::GetTokenPrice => {
                let price = self
                    .chain_data
                    .token_price(address, KnownChain::Ethereum)
                    .await?;
                AgentResponse::new(
                    ResponseKind::TokenPrice,
                    format!("Current token price: {price}"),
                )
            }
            AgentAction::GetNfts => {
                let nfts = self.chain_data.nfts(address).await?;
                let content = if nfts.is_empty() {
                    "You don't have any NFTs".to_string()
                } else {
                    let names = nfts.iter().map(|n| n.name.as_str()).collect::<Vec<_>>();
                    format!("Your NFTs:\n{}", names.join("\n"))
                };
                AgentResponse::new(ResponseKind::Nfts, content)
            }
            AgentAction::GetTransactions => {
                let txs = self
                    .chain_data
                    .transactions(address, KnownChain::Ethereum)
                    .await?;
                let hashes = txs.iter().map(|t| t.hash.as_str()).collect::<Vec<_>>();
                AgentResponse::new(
                    ResponseKind::Transactions,
                    format!("Your transactions:\n{}", hashes.join("\n")),
                )
            }
            AgentAction::GetNftFloorPrice => {
                let contract = nft_contract_in(input);
                let content = match self.chain_data.nft_floor_price(&contract).await? {
                    Some(floor) => format!(
                        "Floor price: {} {}",
                        floor.floor_price,
                        floor.price_currency.as_deref().unwrap_or("ETH")
                    ),
                    None => "Floor price not available".to_string(),
                };
                AgentResponse::new(ResponseKind::NftPrice, content)
            }
            AgentAction::GetSwapRate => {
                let intent = self.assistant.extract(input).await?;
                let quote = self
                    .swaps
                    .quote(
                        intent.token1.as_deref().unwrap_or_default(),
                        intent.token2.as_deref().unwrap_or_default(),
                        intent.amount.as_deref().unwrap_or_default(),
                    )
                    .await?;
                AgentResponse::new(ResponseKind::SwapRate, format!("Swap rate: {}", quote.price))
            }
            AgentAction::Transact => {
                let steps = self.assistant.transact(input, address).await?;
                let first = steps
                    .first()
                    .ok_or_else(|| anyhow!("assistant returned no transaction"))?;
                AgentResponse::new(ResponseKind::Transaction, first.description.clone())
            }
            AgentAction::GenerateCode => {
                let code = self.assistant.generate_code(input).await?;
                AgentResponse::new(ResponseKind::Code, code.contract)
            }
            AgentAction::Ask => {
                let answer = self.assistant.ask(input).await?;
                AgentResponse::new(ResponseKind::Ask, answer.answer)
            }
        };
        Ok(response)
    }

    async fn balance(&self, input: &str, address: &str) -> Result<AgentResponse, AgentError> {
        let lowercase = input.to_lowercase();
        let eth = self.chain_data.balance(address, KnownChain::Ethereum).await?;
        let matic = self.chain_data.balance(address, KnownChain::Polygon).await?;
        let content = if lowercase.contains("matic") {
            format!("Your Polygon balance: {matic} MATIC")
        } else if lowercase.contains("eth") {
            format!("Your Ethereum balance: {eth} ETH")
        } else {
            format!("Your wallet balances:\nEthereum: {eth} ETH\nPolygon: {matic} MATIC")
        };
        Ok(AgentResponse::new(ResponseKind::Balance, content))
    }

    /// Asks the assistant to explain an agent decision, only once the
    /// bridge request it produced has been processed.
    pub async fn get_action_explanation(
        &self,
        request_hash: RequestHash,
    ) -> Result<String, AgentError> {
        if !self.dispatch.is_transaction_processed(request_hash).await? {
            return Err(AgentError::NotYetProcessed(request_hash));
        }
        Ok(self.assistant.explain_decision(request_hash).await?)
    }

    /// Extracts a bridge intent from `input` and estimates its gas.
    pub async fn estimate_action_gas(&self, input: &str) -> Result<GasEstimate, AgentError> {
        let intent = self.assistant.extract(input).await?;
        let transaction = bridge_transaction_from_intent(&intent)?;
        Ok(self.dispatch.estimate_gas(&transaction).await?)
    }
}

/// token1 is the token to move, chain the destination, token2 an optional
/// hex payload.
fn bridge_transaction_from_intent(intent: &ExtractedIntent) -> Result<BridgeTransaction, AgentError> {
    let token = intent
        .token1
        .as_deref()
        .ok_or(AgentError::IncompleteIntent("a token address"))?;
    let amount = intent
        .amount
        .as_deref()
        .ok_or(AgentError::IncompleteIntent("an amount"))?;
    let chain = intent
        .chain
        .as_deref()
        .ok_or(AgentError::IncompleteIntent("a target chain"))?;
    let target_chain_id = resolve_chain_id(chain)
        .ok_or_else(|| BridgeError::from(ValidationError::UnknownChain(chain.to_string())))?;
    let data = intent
        .token2
        .as_deref()
        .and_then(|hex| Bytes::from_str(hex).ok())
        .unwrap_or_default();
    Ok(BridgeTransaction::new(token, amount, target_chain_id).with_data(data))
}

fn nft_contract_in(input: &str) -> String {
    input
        .split(|c: char| c.is_whitespace() || c == ',' || c == '?')
        .find(|word| parse_address(word).is_ok())
        .unwrap_or(DEFAULT_NFT_CONTRACT)
        .to_string()
}
