// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory model of the AIBridgeAgent registry contract.
//!
//! The dispatch service never mutates this state; it only calls the contract.
//! The model exists so that the contract's dedup and authorization behavior
//! can be exercised without a node. Every method takes the calling account
//! explicitly (the `msg.sender` of the modeled call) and either applies its
//! effects completely or fails with the exact revert string of the contract.

use crate::types::RequestHash;
use ethers::types::{Address as EthAddress, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Not authorized AI agent")]
    NotAuthorizedAgent,
    #[error("Transaction already processed")]
    AlreadyProcessed,
    #[error("Ownable: caller is not the owner")]
    NotOwner,
    #[error("Invalid interface address")]
    InvalidInterfaceAddress,
    #[error("Caller is not the bridge interface")]
    NotBridgeInterface,
    #[error("Unknown bridge request")]
    UnknownRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    BridgeRequestInitiated {
        request_hash: RequestHash,
        agent: EthAddress,
        amount: U256,
        target_chain_id: u64,
    },
    BridgeRequestProcessed {
        request_hash: RequestHash,
    },
    AgentAuthorizationUpdated {
        agent: EthAddress,
        authorized: bool,
    },
    BridgeInterfaceUpdated {
        bridge_interface: EthAddress,
    },
}

#[derive(Debug, Clone)]
pub struct BridgeRegistry {
    owner: EthAddress,
    bridge_interface: EthAddress,
    authorized_agents: HashMap<EthAddress, bool>,
    // Presence means the request exists; the value is its processed flag
    requests: HashMap<RequestHash, bool>,
    events: Vec<RegistryEvent>,
}

impl BridgeRegistry {
    pub fn new(owner: EthAddress, bridge_interface: EthAddress) -> Self {
        Self {
            owner,
            bridge_interface,
            authorized_agents: HashMap::new(),
            requests: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn owner(&self) -> EthAddress {
        self.owner
    }

    pub fn bridge_interface(&self) -> EthAddress {
        self.bridge_interface
    }

    pub fn is_authorized(&self, agent: EthAddress) -> bool {
        self.authorized_agents.get(&agent).copied().unwrap_or(false)
    }

    /// Unknown hashes read as `false`.
    pub fn is_transaction_processed(&self, request_hash: &RequestHash) -> bool {
        self.requests.get(request_hash).copied().unwrap_or(false)
    }

    pub fn request_exists(&self, request_hash: &RequestHash) -> bool {
        self.requests.contains_key(request_hash)
    }

    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    fn only_owner(&self, caller: EthAddress) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::NotOwner);
        }
        Ok(())
    }

    pub fn set_ai_agent_authorization(
        &mut self,
        caller: EthAddress,
        agent: EthAddress,
        authorized: bool,
    ) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        self.authorized_agents.insert(agent, authorized);
        self.events.push(RegistryEvent::AgentAuthorizationUpdated { agent, authorized });
        Ok(())
    }

    pub fn update_bridge_interface(
        &mut self,
        caller: EthAddress,
        new_interface: EthAddress,
    ) -> Result<(), RegistryError> {
        self.only_owner(caller)?;
        if new_interface.is_zero() {
            return Err(RegistryError::InvalidInterfaceAddress);
        }
        self.bridge_interface = new_interface;
        self.events.push(RegistryEvent::BridgeInterfaceUpdated {
            bridge_interface: new_interface,
        });
        Ok(())
    }

    /// Records a new request keyed by its content hash at `block_timestamp`.
    /// Identical inputs in the same timestamp window collide and revert.
    pub fn initiate_bridge_transaction(
        &mut self,
        caller: EthAddress,
        token: EthAddress,
        amount: U256,
        target_chain_id: u64,
        data: &Bytes,
        block_timestamp: u64,
    ) -> Result<RequestHash, RegistryError> {
        if !self.is_authorized(caller) {
            return Err(RegistryError::NotAuthorizedAgent);
        }
        let request_hash =
            RequestHash::compute(token, amount, target_chain_id, data, block_timestamp);
        if self.requests.contains_key(&request_hash) {
            return Err(RegistryError::AlreadyProcessed);
        }
        self.requests.insert(request_hash, false);
        self.events.push(RegistryEvent::BridgeRequestInitiated {
            request_hash,
            agent: caller,
            amount,
            target_chain_id,
        });
        Ok(request_hash)
    }

    /// Settlement-side follow-up: flips the processed flag. Idempotent once set.
    pub fn complete_bridge_transaction(
        &mut self,
        caller: EthAddress,
        request_hash: RequestHash,
    ) -> Result<(), RegistryError> {
        if caller != self.bridge_interface {
            return Err(RegistryError::NotBridgeInterface);
        }
        let processed = self
            .requests
            .get_mut(&request_hash)
            .ok_or(RegistryError::UnknownRequest)?;
        if !*processed {
            *processed = true;
            self.events
                .push(RegistryEvent::BridgeRequestProcessed { request_hash });
        }
        Ok(())
    }
}
