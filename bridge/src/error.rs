// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Local, synchronous rejection of a bridge transaction. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // The token field is not a well-formed chain address
    #[error("Invalid token address: {0}")]
    InvalidAddress(String),
    // The amount does not parse to a strictly positive base-unit quantity
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    // The target chain is not in the supported-chain whitelist
    #[error("Unsupported target chain: {0}")]
    UnsupportedChain(u64),
    // A chain given by name that is not in the chain catalog
    #[error("Unsupported chain: {0}")]
    UnknownChain(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    // The transaction failed local validation
    #[error(transparent)]
    Validation(#[from] ValidationError),
    // The simulated call reverted; carries the revert reason
    #[error("Gas estimation failed: {0}")]
    GasEstimationFailed(String),
    // The contract reverted the actual submission (authorization, duplicate request hash)
    #[error("Bridge transaction submission failed: {0}")]
    SubmissionFailed(String),
    // Transport or connectivity failure talking to the node
    #[error("Network error: {0}")]
    NetworkError(String),
    // Configuration could not be turned into a working service
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    // Uncategorized error
    #[error("{0}")]
    Generic(String),
}

impl BridgeError {
    /// Returns a short string identifying the error type for metrics labels and logs
    pub fn error_type(&self) -> &'static str {
        match self {
            BridgeError::Validation(ValidationError::InvalidAddress(_)) => "invalid_address",
            BridgeError::Validation(ValidationError::InvalidAmount(_)) => "invalid_amount",
            BridgeError::Validation(ValidationError::UnsupportedChain(_))
            | BridgeError::Validation(ValidationError::UnknownChain(_)) => "unsupported_chain",
            BridgeError::GasEstimationFailed(_) => "gas_estimation_failed",
            BridgeError::SubmissionFailed(_) => "submission_failed",
            BridgeError::NetworkError(_) => "network_error",
            BridgeError::InvalidConfig(_) => "invalid_config",
            BridgeError::Generic(_) => "generic",
        }
    }

    /// Whether a caller may reasonably retry the same request unchanged.
    /// Only connectivity failures qualify; this crate never retries on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, BridgeError::NetworkError(_))
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
