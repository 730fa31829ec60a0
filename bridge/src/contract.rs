// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The seam between the dispatch service and a deployed registry contract.

use crate::transaction::ValidTransaction;
use crate::types::{BridgeSubmission, RequestHash};
use async_trait::async_trait;
use ethers::types::U256;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractCallError {
    /// The contract (or the node simulating it) rejected the call.
    #[error("execution reverted: {0}")]
    Reverted(String),
    /// The call never got a verdict from the node.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ContractCallError {
    pub fn is_revert(&self) -> bool {
        matches!(self, ContractCallError::Reverted(_))
    }
}

#[async_trait]
pub trait BridgeContract: Send + Sync {
    /// Gas the node expects `initiateBridgeTransaction` to consume when sent
    /// from this contract handle's account.
    async fn estimate_initiate_gas(&self, tx: &ValidTransaction) -> Result<U256, ContractCallError>;

    /// Sends `initiateBridgeTransaction` with `gas_limit` and waits for the
    /// transaction to be included.
    async fn initiate(
        &self,
        tx: &ValidTransaction,
        gas_limit: U256,
    ) -> Result<BridgeSubmission, ContractCallError>;

    async fn is_transaction_processed(
        &self,
        request_hash: RequestHash,
    ) -> Result<bool, ContractCallError>;
}
