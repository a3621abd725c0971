//! # Prometheus Metrics
//!
//! Operational metrics for the registry node, scraped from `/metrics` on
//! the dedicated metrics port. Registered in a custom registry with the
//! `veris` namespace so nothing collides with default-registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (prometheus handles are internally shared) so it can be
/// used from every request handler.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Registry that owns all metrics below.
    registry: Registry,
    /// Total ledger operations that committed.
    pub operations_total: IntCounter,
    /// Total ledger operations rejected during validation.
    pub operations_rejected_total: IntCounter,
    /// Current total supply in smallest units.
    pub total_supply: IntGauge,
    /// Holders with a non-zero balance.
    pub active_holders: IntGauge,
    /// Snapshots taken since startup.
    pub snapshots_total: IntCounter,
    /// Dividend events deposited since startup.
    pub dividends_deposited_total: IntCounter,
    /// Latency of ledger operations in seconds (lock wait included).
    pub operation_latency_seconds: Histogram,
}

impl LedgerMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("veris".into()), None)
            .expect("failed to create prometheus registry");

        let operations_total = IntCounter::new(
            "operations_total",
            "Total number of committed ledger operations",
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_total.clone()))
            .expect("metric registration");

        let operations_rejected_total = IntCounter::new(
            "operations_rejected_total",
            "Total number of ledger operations rejected during validation",
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_rejected_total.clone()))
            .expect("metric registration");

        let total_supply = IntGauge::new("total_supply", "Current total supply in smallest units")
            .expect("metric creation");
        registry
            .register(Box::new(total_supply.clone()))
            .expect("metric registration");

        let active_holders = IntGauge::new("active_holders", "Holders with a non-zero balance")
            .expect("metric creation");
        registry
            .register(Box::new(active_holders.clone()))
            .expect("metric registration");

        let snapshots_total =
            IntCounter::new("snapshots_total", "Snapshots taken since startup")
                .expect("metric creation");
        registry
            .register(Box::new(snapshots_total.clone()))
            .expect("metric registration");

        let dividends_deposited_total = IntCounter::new(
            "dividends_deposited_total",
            "Dividend events deposited since startup",
        )
        .expect("metric creation");
        registry
            .register(Box::new(dividends_deposited_total.clone()))
            .expect("metric registration");

        let operation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "operation_latency_seconds",
                "Ledger operation latency in seconds, lock wait included",
            )
            .buckets(vec![0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            operations_total,
            operations_rejected_total,
            total_supply,
            active_holders,
            snapshots_total,
            dividends_deposited_total,
            operation_latency_seconds,
        }
    }

    /// Encodes all registered metrics into Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for LedgerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics handle passed to axum handlers.
pub type SharedMetrics = Arc<LedgerMetrics>;

/// Axum handler rendering `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
