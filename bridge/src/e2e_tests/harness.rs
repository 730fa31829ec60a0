// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Polling helper for flows where settlement happens in the background.

use anyhow::Context;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Submission,
    Settlement,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Submission => "submission",
            Phase::Settlement => "settlement",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollConfig {
    pub fn fast() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::from_millis(20),
        }
    }
}

/// Calls `check` until it yields a value or the timeout passes. The last
/// error seen, if any, is kept as the cause of the timeout.
pub async fn poll_until<T, Fut>(
    phase: Phase,
    what: &'static str,
    cfg: PollConfig,
    mut check: impl FnMut() -> Fut,
) -> anyhow::Result<T>
where
    Fut: std::future::Future<Output = anyhow::Result<Option<T>>>,
{
    let start = Instant::now();
    let mut last_err: Option<anyhow::Error> = None;

    loop {
        match check().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => last_err = Some(e),
        }

        if start.elapsed() >= cfg.timeout {
            let err_ctx = format!("timeout waiting for {what} ({phase})");
            return match last_err {
                Some(e) => Err(e).context(err_ctx),
                None => Err(anyhow::anyhow!("{err_ctx}")),
            };
        }

        tokio::time::sleep(cfg.interval).await;
    }
}
