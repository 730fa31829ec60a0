// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end flows through the dispatch service against a simulated
//! registry deployment.

mod harness;
mod scenarios;
