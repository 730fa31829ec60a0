// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Histogram, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Registry,
};

const FINE_GRAINED_LATENCY_SEC_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.6, 0.7, 0.8, 0.9,
    1.0, 1.2, 1.4, 1.6, 1.8, 2.0, 2.5, 3.0, 3.5, 4.0, 5.0, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0, 9.5,
    10., 15., 20., 25., 30., 35., 40., 45., 50., 60., 70., 80., 90., 100., 120., 140., 160., 180.,
    200., 250., 300., 350., 400.,
];

// Gas units; a plain transfer is 21k, bridge calls land in the 50k-500k range
const GAS_ESTIMATE_BUCKETS: &[f64] = &[
    21_000., 30_000., 50_000., 75_000., 100_000., 150_000., 200_000., 300_000., 500_000.,
    750_000., 1_000_000., 2_000_000., 5_000_000.,
];

#[derive(Clone, Debug)]
pub struct BridgeMetrics {
    pub(crate) dispatch_requests: IntCounterVec,
    pub(crate) dispatch_errors: IntCounterVec,
    pub(crate) gas_estimates: Histogram,
    pub(crate) submitted_transactions: IntCounter,
    pub(crate) processed_observations: IntCounter,

    pub(crate) eth_rpc_queries: IntCounterVec,
    pub(crate) eth_rpc_queries_latency: HistogramVec,
    pub(crate) eth_node_connected: IntGauge,
}

impl BridgeMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            dispatch_requests: register_int_counter_vec_with_registry!(
                "bridge_dispatch_requests",
                "Total number of dispatch service calls, by operation",
                &["operation"],
                registry,
            )
            .unwrap(),
            dispatch_errors: register_int_counter_vec_with_registry!(
                "bridge_dispatch_errors",
                "Total number of failed dispatch service calls, by operation and error type",
                &["operation", "error_type"],
                registry,
            )
            .unwrap(),
            gas_estimates: register_histogram_with_registry!(
                "bridge_gas_estimates",
                "Raw gas estimates returned by the network before buffering",
                GAS_ESTIMATE_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            submitted_transactions: register_int_counter_with_registry!(
                "bridge_submitted_transactions",
                "Total number of bridge transactions included on chain",
                registry,
            )
            .unwrap(),
            processed_observations: register_int_counter_with_registry!(
                "bridge_processed_observations",
                "Total number of status queries that observed a processed request",
                registry,
            )
            .unwrap(),
            eth_rpc_queries: register_int_counter_vec_with_registry!(
                "bridge_eth_rpc_queries",
                "Total number of queries issued to eth provider, by request type",
                &["type"],
                registry,
            )
            .unwrap(),
            eth_rpc_queries_latency: register_histogram_vec_with_registry!(
                "bridge_eth_rpc_queries_latency",
                "Latency of queries issued to eth provider, by request type",
                &["type"],
                FINE_GRAINED_LATENCY_SEC_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
            eth_node_connected: register_int_gauge_with_registry!(
                "bridge_eth_node_connected",
                "Whether the last query to the eth node succeeded (1) or failed (0)",
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        let registry = Registry::new();
        Self::new(&registry)
    }

    pub(crate) fn record_request(&self, operation: &str) {
        self.dispatch_requests
            .with_label_values(&[operation])
            .inc();
    }

    pub(crate) fn record_error(&self, operation: &str, error_type: &str) {
        self.dispatch_errors
            .with_label_values(&[operation, error_type])
            .inc();
    }
}
