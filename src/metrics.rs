// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the cluster pool.
//!
//! This module provides metrics collection with the namespace prefix `clusterpool_`.
//!
//! # Metrics Categories
//!
//! - **Cluster Operation Metrics** - Creations, deletions and recreations and their outcomes
//! - **Parameter Cache Metrics** - Cache hits and misses
//! - **Selection Metrics** - Duration and outcome of choosing a cluster for a scenario
//! - **Pool Metrics** - Number of clusters currently tracked
//!
//! # Example
//!
//! ```rust
//! use clusterpool::metrics::{gather_metrics, record_cluster_operation, OP_CREATE, STATUS_SUCCESS};
//!
//! record_cluster_operation(OP_CREATE, STATUS_SUCCESS);
//! assert!(gather_metrics().unwrap().contains("clusterpool_cluster_operations_total"));
//! ```

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all pool metrics
const METRICS_NAMESPACE: &str = "clusterpool";

/// `operation` label value for cluster creation
pub const OP_CREATE: &str = "create";

/// `operation` label value for cluster deletion
pub const OP_DELETE: &str = "delete";

/// `operation` label value for recreating an unhealthy cluster
pub const OP_RECREATE: &str = "recreate";

/// `status` label value for a successful operation
pub const STATUS_SUCCESS: &str = "success";

/// `status` label value for a failed operation
pub const STATUS_ERROR: &str = "error";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Cluster Operation Metrics
// ============================================================================

/// Total number of cluster operations by operation and status
///
/// Labels:
/// - `operation`: `create`, `delete` or `recreate`
/// - `status`: `success` or `error`
pub static CLUSTER_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cluster_operations_total"),
        "Total number of cluster operations by operation and status",
    );
    let counter = CounterVec::new(opts, &["operation", "status"])
        .expect("cluster operation counter definition is valid");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("cluster operation counter is registered once");
    counter
});

// ============================================================================
// Parameter Cache Metrics
// ============================================================================

/// Total number of parameter cache lookups by result
///
/// Labels:
/// - `result`: `hit` or `miss`
pub static PARAM_CACHE_LOOKUPS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_param_cache_lookups_total"),
        "Total number of parameter cache lookups by result",
    );
    let counter = CounterVec::new(opts, &["result"])
        .expect("parameter cache counter definition is valid");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("parameter cache counter is registered once");
    counter
});

// ============================================================================
// Selection Metrics
// ============================================================================

/// Duration of choosing a cluster for a scenario
///
/// Labels:
/// - `outcome`: `chosen` or `failed`
pub static SELECTION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_selection_duration_seconds"),
        "Duration of choosing a cluster for a scenario by outcome",
    )
    .buckets(vec![0.1, 1.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1200.0, 1800.0]);
    let histogram = HistogramVec::new(opts, &["outcome"])
        .expect("selection histogram definition is valid");
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("selection histogram is registered once");
    histogram
});

// ============================================================================
// Pool Metrics
// ============================================================================

/// Number of clusters currently tracked by the pool
pub static POOL_SIZE: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_pool_size"),
        "Number of clusters currently tracked by the pool",
    )
    .expect("pool size gauge definition is valid");
    METRICS_REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("pool size gauge is registered once");
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record the outcome of a cluster operation
///
/// # Arguments
/// * `operation` - One of [`OP_CREATE`], [`OP_DELETE`], [`OP_RECREATE`]
/// * `status` - [`STATUS_SUCCESS`] or [`STATUS_ERROR`]
pub fn record_cluster_operation(operation: &str, status: &str) {
    CLUSTER_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}

/// Record a parameter cache lookup
pub fn record_param_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    PARAM_CACHE_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

/// Record how long choosing a cluster took
pub fn record_selection(chosen: bool, duration: Duration) {
    let outcome = if chosen { "chosen" } else { "failed" };
    SELECTION_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record the number of clusters tracked by the pool
#[allow(clippy::cast_precision_loss)]
pub fn record_pool_size(size: usize) {
    POOL_SIZE.set(size as f64);
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
