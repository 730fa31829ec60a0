// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The bridge dispatch service: validates bridge transactions, estimates
//! gas, submits them to the registry contract and tracks whether the
//! resulting requests have been processed.
//!
//! The service never retries. Validation and submission race against
//! on-chain state: a transaction that passed [`BridgeDispatchService::validate_transaction`]
//! may still fail on submission if the agent is de-authorized or an
//! identical request lands first. Callers decide whether to try again.

use crate::contract::{BridgeContract, ContractCallError};
use crate::error::{BridgeError, BridgeResult, ValidationError};
use crate::metrics::BridgeMetrics;
use crate::transaction::{validate_with_decimals, BridgeTransaction, ValidTransaction};
use crate::types::{
    resolve_chain_id, BridgeRequestStatus, BridgeSubmission, ChainWhitelist, GasBuffer,
    GasEstimate, RequestHash, SubmissionHash, DEFAULT_TOKEN_DECIMALS,
};
use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tap::TapFallible;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const OP_ESTIMATE_GAS: &str = "estimate_gas";
const OP_VALIDATE: &str = "validate";
const OP_INITIATE: &str = "initiate";
const OP_IS_PROCESSED: &str = "is_processed";
const OP_BRIDGE_TOKEN: &str = "bridge_token";

/// Policy handed to the service at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchConfig {
    pub supported_chains: ChainWhitelist,
    pub gas_buffer: GasBuffer,
    pub token_decimals: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            supported_chains: ChainWhitelist::default(),
            gas_buffer: GasBuffer::default(),
            token_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

/// Input of the end-to-end bridging flow: the target chain may be given by
/// name ("polygon") or by decimal id ("137").
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeTokenParams {
    pub token_address: String,
    pub amount: String,
    pub destination_chain: String,
    #[serde(default)]
    pub data: Bytes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOutcome {
    pub submission_hash: SubmissionHash,
    pub request_hash: RequestHash,
    pub estimated_gas: GasEstimate,
}

pub struct BridgeDispatchService<C> {
    contract: C,
    config: DispatchConfig,
    metrics: Arc<BridgeMetrics>,
    // Requests this service has seen processed; the flag never goes back.
    // Unbounded: one entry per settled request for the lifetime of the service.
    observed_processed: Mutex<HashSet<RequestHash>>,
}

impl<C: BridgeContract> BridgeDispatchService<C> {
    pub fn new(contract: C, config: DispatchConfig, metrics: Arc<BridgeMetrics>) -> Self {
        Self {
            contract,
            config,
            metrics,
            observed_processed: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    /// Pure local checks: address, amount, then target chain.
    pub fn validate(&self, transaction: &BridgeTransaction) -> Result<ValidTransaction, ValidationError> {
        validate_with_decimals(
            transaction,
            &self.config.supported_chains,
            self.config.token_decimals,
        )
    }

    fn record_failure(&self, operation: &str, err: &BridgeError) {
        self.metrics.record_error(operation, err.error_type());
        warn!(
            operation,
            error_type = err.error_type(),
            "bridge dispatch failed: {}",
            err
        );
    }

    async fn estimate_valid(
        &self,
        valid: &ValidTransaction,
        on_revert: fn(String) -> BridgeError,
    ) -> BridgeResult<GasEstimate> {
        let estimated = self
            .contract
            .estimate_initiate_gas(valid)
            .await
            .map_err(|e| match e {
                ContractCallError::Reverted(reason) => on_revert(reason),
                ContractCallError::Transport(msg) => BridgeError::NetworkError(msg),
            })?;
        self.metrics
            .gas_estimates
            .observe(estimated.min(U256::from(u64::MAX)).as_u64() as f64);
        let gas_limit = self.config.gas_buffer.apply(estimated);
        debug!(%estimated, %gas_limit, "gas estimated for initiateBridgeTransaction");
        Ok(GasEstimate {
            estimated,
            gas_limit,
        })
    }

    /// Simulates `initiateBridgeTransaction` for `transaction`. A revert
    /// surfaces as [`BridgeError::GasEstimationFailed`] with the reason.
    pub async fn estimate_gas(&self, transaction: &BridgeTransaction) -> BridgeResult<GasEstimate> {
        self.metrics.record_request(OP_ESTIMATE_GAS);
        let result = async {
            let valid = self.validate(transaction)?;
            self.estimate_valid(&valid, BridgeError::GasEstimationFailed)
                .await
        }
        .await;
        result.tap_err(|e| self.record_failure(OP_ESTIMATE_GAS, e))
    }

    /// Best-effort pre-flight check. Returns `false` on any failure, local or
    /// remote, and logs why. Passing it does not guarantee that a later
    /// submission succeeds.
    pub async fn validate_transaction(&self, transaction: &BridgeTransaction) -> bool {
        self.metrics.record_request(OP_VALIDATE);
        let result = match self.validate(transaction) {
            Ok(valid) => {
                self.estimate_valid(&valid, BridgeError::GasEstimationFailed)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(_) => true,
            Err(e) => {
                warn!(
                    error_type = e.error_type(),
                    "bridge transaction failed pre-flight validation: {}",
                    e
                );
                self.metrics.record_error(OP_VALIDATE, e.error_type());
                false
            }
        }
    }

    /// Submits the bridge call and waits for inclusion. Returns the chain's
    /// transaction hash, not the registry's request hash.
    pub async fn initiate_bridge_transaction(
        &self,
        transaction: &BridgeTransaction,
    ) -> BridgeResult<SubmissionHash> {
        self.submit_bridge_transaction(transaction)
            .await
            .map(|submission| submission.submission_hash)
    }

    /// Like [`Self::initiate_bridge_transaction`], also returning the request
    /// hash the registry recorded.
    pub async fn submit_bridge_transaction(
        &self,
        transaction: &BridgeTransaction,
    ) -> BridgeResult<BridgeSubmission> {
        self.metrics.record_request(OP_INITIATE);
        let result = async {
            let valid = self.validate(transaction)?;
            let estimate = self
                .estimate_valid(&valid, BridgeError::SubmissionFailed)
                .await?;
            self.send(&valid, estimate).await
        }
        .await;
        result.tap_err(|e| self.record_failure(OP_INITIATE, e))
    }

    async fn send(
        &self,
        valid: &ValidTransaction,
        estimate: GasEstimate,
    ) -> BridgeResult<BridgeSubmission> {
        let submission = self
            .contract
            .initiate(valid, estimate.gas_limit)
            .await
            .map_err(|e| match e {
                ContractCallError::Reverted(reason) => BridgeError::SubmissionFailed(reason),
                ContractCallError::Transport(msg) => BridgeError::NetworkError(msg),
            })?;
        self.metrics.submitted_transactions.inc();
        info!(
            submission_hash = %submission.submission_hash,
            request_hash = %submission.request_hash,
            target_chain_id = valid.target_chain_id,
            "bridge transaction included"
        );
        Ok(submission)
    }

    /// Reads the registry's processed flag. Unknown hashes read as `false`.
    /// Once a hash has been seen processed it is answered from memory.
    pub async fn is_transaction_processed(&self, request_hash: RequestHash) -> BridgeResult<bool> {
        self.metrics.record_request(OP_IS_PROCESSED);
        if self.observed_processed.lock().await.contains(&request_hash) {
            return Ok(true);
        }
        let processed = self
            .contract
            .is_transaction_processed(request_hash)
            .await
            .map_err(|e| match e {
                ContractCallError::Transport(msg) => BridgeError::NetworkError(msg),
                // The view never reverts on a healthy contract: wrong address or a broken node
                ContractCallError::Reverted(reason) => BridgeError::NetworkError(format!(
                    "isTransactionProcessed reverted: {reason}"
                )),
            })
            .tap_err(|e| self.record_failure(OP_IS_PROCESSED, e))?;
        if processed && self.observed_processed.lock().await.insert(request_hash) {
            self.metrics.processed_observations.inc();
            info!(%request_hash, "bridge request observed processed");
        }
        Ok(processed)
    }

    /// Where a request stands: `None` means nothing was submitted yet.
    pub async fn request_status(
        &self,
        request_hash: Option<RequestHash>,
    ) -> BridgeResult<BridgeRequestStatus> {
        let Some(request_hash) = request_hash else {
            return Ok(BridgeRequestStatus::Unsubmitted);
        };
        Ok(if self.is_transaction_processed(request_hash).await? {
            BridgeRequestStatus::Processed
        } else {
            BridgeRequestStatus::StillPending
        })
    }

    /// Resolve the destination chain, validate, estimate and submit in one go.
    pub async fn bridge_token(&self, params: BridgeTokenParams) -> BridgeResult<BridgeOutcome> {
        self.metrics.record_request(OP_BRIDGE_TOKEN);
        let result = async {
            let target_chain_id = resolve_chain_id(&params.destination_chain).ok_or_else(|| {
                ValidationError::UnknownChain(params.destination_chain.clone())
            })?;
            let transaction = BridgeTransaction::new(
                params.token_address.as_str(),
                params.amount.as_str(),
                target_chain_id,
            )
            .with_data(params.data.clone());
            let valid = self.validate(&transaction)?;
            let estimated_gas = self
                .estimate_valid(&valid, BridgeError::SubmissionFailed)
                .await?;
            let submission = self.send(&valid, estimated_gas).await?;
            Ok::<_, BridgeError>(BridgeOutcome {
                submission_hash: submission.submission_hash,
                request_hash: submission.request_hash,
                estimated_gas,
            })
        }
        .await;
        result.tap_err(|e| self.record_failure(OP_BRIDGE_TOKEN, e))
    }
}
