// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A single-node chain that hosts one [`BridgeRegistry`] and implements
//! [`BridgeContract`] against it.
//!
//! Every handle returned by [`SimulatedBridgeContract::connect`] shares the
//! same chain state and sends calls from its own account. Blocks are mined
//! instantly and keep the current timestamp until [`advance_time`] is called,
//! so two identical submissions without a time step land in the same
//! timestamp window.
//!
//! [`advance_time`]: SimulatedBridgeContract::advance_time

use crate::contract::{BridgeContract, ContractCallError};
use crate::registry::{BridgeRegistry, RegistryError, RegistryEvent};
use crate::transaction::ValidTransaction;
use crate::types::{BridgeSubmission, RequestHash, SubmissionHash};
use async_trait::async_trait;
use ethers::abi::{encode, Token};
use ethers::types::{Address as EthAddress, H256, U256};
use ethers::utils::{id, keccak256};
use std::sync::Arc;
use tokio::sync::Mutex;

const INITIATE_SIGNATURE: &str = "initiateBridgeTransaction(address,uint256,uint256,bytes)";

const TX_BASE_GAS: u64 = 21_000;
const CALLDATA_ZERO_BYTE_GAS: u64 = 4;
const CALLDATA_NONZERO_BYTE_GAS: u64 = 16;
// Fresh storage slot for the request plus the event and access overhead
const INITIATE_EXECUTION_GAS: u64 = 22_100 + 3_000;

struct ChainState {
    registry: BridgeRegistry,
    timestamp: u64,
    nonce: u64,
    online: bool,
}

impl ChainState {
    fn ensure_online(&self) -> Result<(), ContractCallError> {
        if !self.online {
            return Err(ContractCallError::Transport(
                "connection refused: simulated node is offline".into(),
            ));
        }
        Ok(())
    }
}

impl From<RegistryError> for ContractCallError {
    fn from(err: RegistryError) -> Self {
        ContractCallError::Reverted(err.to_string())
    }
}

#[derive(Clone)]
pub struct SimulatedBridgeContract {
    state: Arc<Mutex<ChainState>>,
    caller: EthAddress,
}

impl SimulatedBridgeContract {
    /// Deploys a fresh registry owned by `owner`; the returned handle calls
    /// from the owner account.
    pub fn deploy(owner: EthAddress, bridge_interface: EthAddress, genesis_timestamp: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                registry: BridgeRegistry::new(owner, bridge_interface),
                timestamp: genesis_timestamp,
                nonce: 0,
                online: true,
            })),
            caller: owner,
        }
    }

    /// A handle on the same chain that sends calls from `caller`.
    pub fn connect(&self, caller: EthAddress) -> Self {
        Self {
            state: self.state.clone(),
            caller,
        }
    }

    pub fn caller(&self) -> EthAddress {
        self.caller
    }

    pub async fn timestamp(&self) -> u64 {
        self.state.lock().await.timestamp
    }

    pub async fn advance_time(&self, seconds: u64) {
        let mut state = self.state.lock().await;
        state.timestamp += seconds;
    }

    /// Takes the node off the network. Every call fails with a transport
    /// error until it is brought back.
    pub async fn set_online(&self, online: bool) {
        self.state.lock().await.online = online;
    }

    pub async fn set_ai_agent_authorization(
        &self,
        agent: EthAddress,
        authorized: bool,
    ) -> Result<(), ContractCallError> {
        let mut state = self.state.lock().await;
        state.ensure_online()?;
        state
            .registry
            .set_ai_agent_authorization(self.caller, agent, authorized)?;
        Ok(())
    }

    pub async fn update_bridge_interface(
        &self,
        new_interface: EthAddress,
    ) -> Result<(), ContractCallError> {
        let mut state = self.state.lock().await;
        state.ensure_online()?;
        state
            .registry
            .update_bridge_interface(self.caller, new_interface)?;
        Ok(())
    }

    /// Marks a request processed; only succeeds when called from the bridge
    /// interface account.
    pub async fn complete_bridge_transaction(
        &self,
        request_hash: RequestHash,
    ) -> Result<(), ContractCallError> {
        let mut state = self.state.lock().await;
        state.ensure_online()?;
        state
            .registry
            .complete_bridge_transaction(self.caller, request_hash)?;
        Ok(())
    }

    pub async fn is_authorized(&self, agent: EthAddress) -> bool {
        self.state.lock().await.registry.is_authorized(agent)
    }

    pub async fn events(&self) -> Vec<RegistryEvent> {
        self.state.lock().await.registry.events().to_vec()
    }

    pub async fn registry(&self) -> BridgeRegistry {
        self.state.lock().await.registry.clone()
    }
}

fn initiate_calldata(tx: &ValidTransaction) -> Vec<u8> {
    let mut calldata = id(INITIATE_SIGNATURE).to_vec();
    calldata.extend(encode(&[
        Token::Address(tx.token),
        Token::Uint(tx.amount),
        Token::Uint(U256::from(tx.target_chain_id)),
        Token::Bytes(tx.data.to_vec()),
    ]));
    calldata
}

fn intrinsic_gas(calldata: &[u8]) -> u64 {
    calldata.iter().fold(TX_BASE_GAS, |gas, byte| {
        gas + if *byte == 0 {
            CALLDATA_ZERO_BYTE_GAS
        } else {
            CALLDATA_NONZERO_BYTE_GAS
        }
    })
}

fn initiate_gas(tx: &ValidTransaction) -> U256 {
    U256::from(intrinsic_gas(&initiate_calldata(tx)) + INITIATE_EXECUTION_GAS)
}

#[async_trait]
impl BridgeContract for SimulatedBridgeContract {
    async fn estimate_initiate_gas(&self, tx: &ValidTransaction) -> Result<U256, ContractCallError> {
        let state = self.state.lock().await;
        state.ensure_online()?;
        // Dry run against a scratch copy so the estimate reverts exactly
        // where the real call would
        let mut scratch = state.registry.clone();
        scratch.initiate_bridge_transaction(
            self.caller,
            tx.token,
            tx.amount,
            tx.target_chain_id,
            &tx.data,
            state.timestamp,
        )?;
        Ok(initiate_gas(tx))
    }

    async fn initiate(
        &self,
        tx: &ValidTransaction,
        gas_limit: U256,
    ) -> Result<BridgeSubmission, ContractCallError> {
        let mut state = self.state.lock().await;
        state.ensure_online()?;
        if gas_limit < initiate_gas(tx) {
            return Err(ContractCallError::Reverted("out of gas".into()));
        }
        let timestamp = state.timestamp;
        let request_hash = state.registry.initiate_bridge_transaction(
            self.caller,
            tx.token,
            tx.amount,
            tx.target_chain_id,
            &tx.data,
            timestamp,
        )?;
        let nonce = state.nonce;
        state.nonce += 1;
        let submission_hash = SubmissionHash::new(H256::from(keccak256(encode(&[
            Token::Address(self.caller),
            Token::Uint(U256::from(nonce)),
            Token::FixedBytes(request_hash.to_fixed_bytes().to_vec()),
        ]))));
        tracing::debug!(
            ?submission_hash,
            ?request_hash,
            timestamp,
            "simulated chain mined initiateBridgeTransaction"
        );
        Ok(BridgeSubmission {
            submission_hash,
            request_hash,
        })
    }

    async fn is_transaction_processed(
        &self,
        request_hash: RequestHash,
    ) -> Result<bool, ContractCallError> {
        let state = self.state.lock().await;
        state.ensure_online()?;
        Ok(state.registry.is_transaction_processed(&request_hash))
    }
}
