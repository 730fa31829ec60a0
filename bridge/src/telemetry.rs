// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Log subscriber setup. Filtering follows `RUST_LOG` and defaults to
//! `info`.

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber for a binary. Fails if one is already set.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
}

/// Safe to call from every test: only the first call installs anything.
pub fn init_for_testing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}
