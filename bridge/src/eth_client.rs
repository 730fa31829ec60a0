// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::abi::{request_hash_from_receipt, EthAIBridgeAgent};
use crate::contract::{BridgeContract, ContractCallError};
use crate::metrics::BridgeMetrics;
use crate::registry::RegistryError;
use crate::transaction::ValidTransaction;
use crate::types::{BridgeSubmission, RequestHash, SubmissionHash};
use crate::utils::{get_metered_eth_signer_client, MeteredEthSigner};
use async_trait::async_trait;
use ethers::contract::{ContractCall, ContractError};
use ethers::providers::{JsonRpcError, Middleware, MiddlewareError, RpcError};
use ethers::types::{Address as EthAddress, U256, U64};
use serde::Serialize;
use tap::TapFallible;

/// [`BridgeContract`] backed by a deployed AIBridgeAgent contract, reached
/// through any ethers middleware stack.
pub struct EthBridgeClient<M> {
    contract: EthAIBridgeAgent<M>,
}

impl EthBridgeClient<MeteredEthSigner> {
    /// Connects a signing, metered client to the contract at
    /// `contract_address`. The node's chain id is queried once for signing.
    pub async fn connect(
        provider_url: &str,
        private_key_hex: &str,
        contract_address: EthAddress,
        metrics: Arc<BridgeMetrics>,
    ) -> anyhow::Result<Self> {
        let signer = get_metered_eth_signer_client(provider_url, private_key_hex, metrics).await?;
        tracing::info!(
            "EthBridgeClient connected to {} as {:?}, contract {:?}",
            provider_url,
            signer.address(),
            contract_address
        );
        Ok(Self::new(contract_address, Arc::new(signer)))
    }
}

impl<M> EthBridgeClient<M>
where
    M: Middleware + 'static,
{
    pub fn new(contract_address: EthAddress, client: Arc<M>) -> Self {
        Self {
            contract: EthAIBridgeAgent::new(contract_address, client),
        }
    }

    pub fn contract_address(&self) -> EthAddress {
        self.contract.address()
    }

    /// Owner, bridge interface and whether `agent` is authorized, read in
    /// three view calls.
    pub async fn contract_info(&self, agent: EthAddress) -> Result<ContractInfo, ContractCallError> {
        let owner = self
            .contract
            .owner()
            .call()
            .await
            .map_err(classify_contract_error)?;
        let bridge_interface = self
            .contract
            .bridge_interface()
            .call()
            .await
            .map_err(classify_contract_error)?;
        let agent_authorized = self.is_authorized(agent).await?;
        Ok(ContractInfo {
            contract_address: self.contract_address(),
            owner,
            bridge_interface,
            agent,
            agent_authorized,
        })
    }

    pub async fn is_authorized(&self, agent: EthAddress) -> Result<bool, ContractCallError> {
        self.contract
            .authorized_ai_agents(agent)
            .call()
            .await
            .map_err(classify_contract_error)
    }

    /// Owner-only. Returns the hash of the included transaction.
    pub async fn set_ai_agent_authorization(
        &self,
        agent: EthAddress,
        authorized: bool,
    ) -> Result<SubmissionHash, ContractCallError> {
        send_and_confirm(self.contract.set_ai_agent_authorization(agent, authorized)).await
    }

    /// Owner-only. The zero address is refused before anything is sent,
    /// with the contract's own revert reason.
    pub async fn update_bridge_interface(
        &self,
        new_interface: EthAddress,
    ) -> Result<SubmissionHash, ContractCallError> {
        if new_interface.is_zero() {
            return Err(ContractCallError::Reverted(
                RegistryError::InvalidInterfaceAddress.to_string(),
            ));
        }
        send_and_confirm(self.contract.update_bridge_interface(new_interface)).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ContractInfo {
    pub contract_address: EthAddress,
    pub owner: EthAddress,
    pub bridge_interface: EthAddress,
    pub agent: EthAddress,
    pub agent_authorized: bool,
}

async fn send_and_confirm<M: Middleware + 'static>(
    call: ContractCall<M, ()>,
) -> Result<SubmissionHash, ContractCallError> {
    let pending = call.send().await.map_err(classify_contract_error)?;
    let tx_hash = pending.tx_hash();
    let receipt = pending
        .await
        .map_err(|e| ContractCallError::Transport(e.to_string()))?
        .ok_or_else(|| dropped(tx_hash))?;
    if receipt.status == Some(U64::zero()) {
        return Err(ContractCallError::Reverted(format!(
            "transaction {:?} reverted on chain",
            tx_hash
        )));
    }
    Ok(SubmissionHash::new(tx_hash))
}

fn dropped(tx_hash: ethers::types::H256) -> ContractCallError {
    ContractCallError::Transport(format!(
        "transaction {:?} was dropped from the mempool",
        tx_hash
    ))
}

/// Splits an ethers contract error into a contract verdict (revert) and
/// everything else. Only an execution revert counts as a verdict; rate
/// limits, node faults and nonce errors are transport failures.
pub(crate) fn classify_contract_error<M: Middleware>(err: ContractError<M>) -> ContractCallError {
    if let Some(reason) = err.decode_revert::<String>() {
        return ContractCallError::Reverted(reason);
    }
    if err.is_revert() {
        return ContractCallError::Reverted(err.to_string());
    }
    let response = err
        .as_middleware_error()
        .and_then(|e| e.as_error_response())
        .or_else(|| err.as_provider_error().and_then(RpcError::as_error_response));
    match response {
        Some(response) if is_execution_revert(response) => {
            ContractCallError::Reverted(response.message.clone())
        }
        Some(response) => ContractCallError::Transport(format!(
            "node error {}: {}",
            response.code, response.message
        )),
        None => ContractCallError::Transport(err.to_string()),
    }
}

// Geth and most clients answer a revert with code 3; some only say so in the message
fn is_execution_revert(response: &JsonRpcError) -> bool {
    response.code == EXECUTION_REVERTED_CODE || response.message.contains("revert")
}

const EXECUTION_REVERTED_CODE: i64 = 3;

#[async_trait]
impl<M> BridgeContract for EthBridgeClient<M>
where
    M: Middleware + 'static,
{
    async fn estimate_initiate_gas(&self, tx: &ValidTransaction) -> Result<U256, ContractCallError> {
        self.contract
            .initiate_bridge_transaction(
                tx.token,
                tx.amount,
                U256::from(tx.target_chain_id),
                tx.data.clone(),
            )
            .estimate_gas()
            .await
            .map_err(classify_contract_error)
            .tap_err(|e| tracing::debug!("eth_estimateGas for initiateBridgeTransaction failed: {e}"))
    }

    async fn initiate(
        &self,
        tx: &ValidTransaction,
        gas_limit: U256,
    ) -> Result<BridgeSubmission, ContractCallError> {
        let call = self
            .contract
            .initiate_bridge_transaction(
                tx.token,
                tx.amount,
                U256::from(tx.target_chain_id),
                tx.data.clone(),
            )
            .gas(gas_limit);
        let pending = call.send().await.map_err(classify_contract_error)?;
        let tx_hash = pending.tx_hash();
        tracing::info!("initiateBridgeTransaction sent: {:?}", tx_hash);

        let receipt = pending
            .await
            .map_err(|e| ContractCallError::Transport(e.to_string()))?
            .ok_or_else(|| dropped(tx_hash))?;
        if receipt.status == Some(U64::zero()) {
            return Err(ContractCallError::Reverted(format!(
                "transaction {:?} reverted on chain",
                tx_hash
            )));
        }
        let request_hash = request_hash_from_receipt(&receipt).ok_or_else(|| {
            ContractCallError::Transport(format!(
                "receipt for {:?} carries no BridgeRequestInitiated event",
                tx_hash
            ))
        })?;
        tracing::info!(
            "initiateBridgeTransaction included: tx_hash={:?}, block={:?}, request_hash={}",
            tx_hash,
            receipt.block_number,
            request_hash
        );
        Ok(BridgeSubmission {
            submission_hash: SubmissionHash::new(tx_hash),
            request_hash,
        })
    }

    async fn is_transaction_processed(
        &self,
        request_hash: RequestHash,
    ) -> Result<bool, ContractCallError> {
        self.contract
            .is_transaction_processed(request_hash.to_fixed_bytes())
            .call()
            .await
            .map_err(classify_contract_error)
    }
}
