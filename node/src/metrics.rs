//! # Prometheus Metrics
//!
//! Operational counters for a serving ledger node, scraped at `/metrics`
//! on the metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Blocks appended through the API since startup.
    pub blocks_appended_total: IntCounter,
    /// Current chain length, genesis included.
    pub chain_length: IntGauge,
    /// Verification passes run.
    pub verifications_total: IntCounter,
    /// Integrity violations reported across all verification passes.
    pub integrity_violations_total: IntCounter,
    /// Time to append and persist one block, in seconds.
    pub append_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("mhchain".into()), None)
            .expect("failed to create prometheus registry");

        let blocks_appended_total = IntCounter::new(
            "blocks_appended_total",
            "Total number of blocks appended since startup",
        )
        .expect("metric creation");
        registry
            .register(Box::new(blocks_appended_total.clone()))
            .expect("metric registration");

        let chain_length = IntGauge::new("chain_length", "Number of blocks in the chain")
            .expect("metric creation");
        registry
            .register(Box::new(chain_length.clone()))
            .expect("metric registration");

        let verifications_total =
            IntCounter::new("verifications_total", "Total number of verification passes")
                .expect("metric creation");
        registry
            .register(Box::new(verifications_total.clone()))
            .expect("metric registration");

        let integrity_violations_total = IntCounter::new(
            "integrity_violations_total",
            "Total integrity violations reported by verification passes",
        )
        .expect("metric creation");
        registry
            .register(Box::new(integrity_violations_total.clone()))
            .expect("metric registration");

        let append_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "append_latency_seconds",
                "Latency of appending and persisting one block, in seconds",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(append_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            blocks_appended_total,
            chain_length,
            verifications_total,
            integrity_violations_total,
            append_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_metrics() {
        let metrics = NodeMetrics::new();
        metrics.blocks_appended_total.inc();
        metrics.chain_length.set(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("mhchain_blocks_appended_total 1"));
        assert!(text.contains("mhchain_chain_length 2"));
    }
}
