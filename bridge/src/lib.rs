// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod abi;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod eth_client;
pub mod intent;
pub mod metered_eth_provider;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod simulated;
pub mod telemetry;
pub mod transaction;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
mod e2e_tests;

pub use dispatch::{BridgeDispatchService, DispatchConfig};
pub use error::{BridgeError, BridgeResult, ValidationError};
pub use transaction::BridgeTransaction;
