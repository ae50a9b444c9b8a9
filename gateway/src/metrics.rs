//! # Prometheus Metrics
//!
//! Operational metrics for the tool gateway, scraped at the `/metrics`
//! endpoint on the dedicated metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] so they do not
//! collide with any default global registry consumers. Everything is
//! labeled by tool name, which keeps the cardinality fixed at the size of
//! the tool vocabulary.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the gateway.
///
/// Clone-friendly (prometheus handles are internally shared) so it can be
/// passed to every request handler.
#[derive(Clone)]
pub struct GatewayMetrics {
    /// Registry that owns all metrics below.
    registry: Registry,
    /// Total tool calls, by tool name.
    pub tool_calls_total: IntCounterVec,
    /// Tool calls that produced an error payload, by tool name.
    pub tool_errors_total: IntCounterVec,
    /// Wall-clock dispatch latency per call, by tool name. Covers the
    /// upstream RPC leg, which is where the time actually goes.
    pub tool_latency_seconds: HistogramVec,
}

impl GatewayMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("helio".into()), None)
            .expect("failed to create prometheus registry");

        let tool_calls_total = IntCounterVec::new(
            Opts::new("tool_calls_total", "Total number of tool calls dispatched"),
            &["tool"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(tool_calls_total.clone()))
            .expect("metric registration");

        let tool_errors_total = IntCounterVec::new(
            Opts::new(
                "tool_errors_total",
                "Tool calls that resolved to an error payload",
            ),
            &["tool"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(tool_errors_total.clone()))
            .expect("metric registration");

        let tool_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "tool_latency_seconds",
                "Wall-clock tool dispatch latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["tool"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(tool_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            tool_calls_total,
            tool_errors_total,
            tool_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition
    /// format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<GatewayMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
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
    fn metrics_register_and_encode() {
        let metrics = GatewayMetrics::new();
        metrics.tool_calls_total.with_label_values(&["getBalance"]).inc();
        metrics
            .tool_errors_total
            .with_label_values(&["getBalance"])
            .inc();
        metrics
            .tool_latency_seconds
            .with_label_values(&["getBalance"])
            .observe(0.02);

        let body = metrics.encode().unwrap();
        assert!(body.contains("helio_tool_calls_total"));
        assert!(body.contains("helio_tool_errors_total"));
        assert!(body.contains("helio_tool_latency_seconds"));
        assert!(body.contains("tool=\"getBalance\""));
    }
}
