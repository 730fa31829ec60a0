// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::types::RequestHash;
use ethers::contract::{abigen, EthLogDecode};
use ethers::types::{Log, TransactionReceipt};

abigen!(
    EthAIBridgeAgent,
    r#"[
        function initiateBridgeTransaction(address _token, uint256 _amount, uint256 _targetChainId, bytes _data) external
        function isTransactionProcessed(bytes32 _txHash) external view returns (bool)
        function setAIAgentAuthorization(address _agent, bool _authorized) external
        function updateBridgeInterface(address _newInterface) external
        function authorizedAIAgents(address) external view returns (bool)
        function bridgeInterface() external view returns (address)
        function owner() external view returns (address)
        event BridgeRequestInitiated(bytes32 indexed txHash, address indexed agent, uint256 amount, uint256 targetChainId)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

/// Decodes a `BridgeRequestInitiated` event from a raw log, ignoring any
/// other event.
pub fn decode_bridge_request_initiated(log: &Log) -> Option<BridgeRequestInitiatedFilter> {
    let raw = ethers::abi::RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    };
    <BridgeRequestInitiatedFilter as EthLogDecode>::decode_log(&raw).ok()
}

/// The request hash of the first `BridgeRequestInitiated` event in a receipt.
pub fn request_hash_from_receipt(receipt: &TransactionReceipt) -> Option<RequestHash> {
    receipt
        .logs
        .iter()
        .find_map(decode_bridge_request_initiated)
        .map(|event| RequestHash::from(event.tx_hash))
}
