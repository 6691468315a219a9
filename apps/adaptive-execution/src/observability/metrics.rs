//! Prometheus metrics for the execution engine.
//!
//! The recording functions go through the `metrics` facade and are no-ops
//! until a recorder is installed with [`init_metrics`].
//!
//! # Example
//!
//! ```ignore
//! use adaptive_execution::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! ```

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsSettings;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for wait durations, in seconds.
    pub wait_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            // Order waits span sub-second fills to multi-minute sequences
            wait_buckets: vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }

    /// Exporter configuration from the `observability.metrics` section.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Configuration`] for an unparsable address.
    pub fn from_settings(settings: &MetricsSettings) -> Result<Self, MetricsError> {
        let addr = settings
            .listen_addr
            .parse()
            .map_err(|e| MetricsError::Configuration(format!("{}: {e}", settings.listen_addr)))?;
        Ok(Self::with_addr(addr))
    }
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.wait_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

// ============================================================================
// Order Submission Metrics
// ============================================================================

/// Record an order submission.
///
/// * `order_type` - `"limit"` or `"market"`
/// * `accepted` - whether the broker accepted the order
pub fn record_order_submission(order_type: &str, accepted: bool) {
    counter!(
        "execution_order_submissions_total",
        "order_type" => order_type.to_string(),
        "status" => if accepted { "accepted" } else { "rejected" }
    )
    .increment(1);
}

/// Record a repeg (cancel and resubmit at a new price).
pub fn record_repeg(symbol: &str) {
    counter!("execution_repegs_total", "symbol" => symbol.to_string()).increment(1);
}

/// Record a switch to the market-order fallback, labelled by the error kind
/// that caused it.
pub fn record_market_fallback(reason: &str) {
    counter!("execution_market_fallbacks_total", "reason" => reason.to_string()).increment(1);
}

// ============================================================================
// Execution Outcome Metrics
// ============================================================================

/// Record the final outcome of one trade execution.
pub fn record_execution_outcome(success: bool, used_fallback: bool, error_kind: Option<&str>) {
    counter!(
        "execution_outcomes_total",
        "outcome" => if success { "success" } else { "failure" },
        "fallback" => if used_fallback { "true" } else { "false" },
        "error_kind" => error_kind.unwrap_or("none").to_string()
    )
    .increment(1);
}

/// Record an execution skipped because it already ran.
pub fn record_idempotent_skip() {
    counter!("execution_idempotent_skips_total").increment(1);
}

// ============================================================================
// Completion Monitoring Metrics
// ============================================================================

/// Record one completion wait.
///
/// * `monitor` - `"streaming"` or `"polling"`
/// * `seconds` - time spent waiting
/// * `timed_out` - ids that did not settle in time
#[allow(clippy::cast_precision_loss)]
pub fn record_completion_wait(monitor: &str, seconds: f64, timed_out: usize) {
    histogram!("execution_completion_wait_seconds", "monitor" => monitor.to_string())
        .record(seconds);
    if timed_out > 0 {
        counter!("execution_completion_timeouts_total", "monitor" => monitor.to_string())
            .increment(timed_out as u64);
    }
}

/// Record a trade update stream reconnect attempt.
pub fn record_stream_reconnect() {
    counter!("execution_stream_reconnects_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MetricsConfig::default();
        assert_eq!(config.listen_addr.port(), 9090);
        assert!(config.wait_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn from_settings_parses_address() {
        let settings = MetricsSettings {
            enabled: true,
            listen_addr: "127.0.0.1:9100".to_string(),
        };
        assert_eq!(
            MetricsConfig::from_settings(&settings).unwrap().listen_addr.port(),
            9100
        );

        let bad = MetricsSettings {
            enabled: true,
            listen_addr: "localhost".to_string(),
        };
        assert!(matches!(
            MetricsConfig::from_settings(&bad),
            Err(MetricsError::Configuration(_))
        ));
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_order_submission("limit", true);
        record_repeg("AAPL");
        record_market_fallback("TIMEOUT");
        record_execution_outcome(false, true, Some("TIMEOUT"));
        record_idempotent_skip();
        record_completion_wait("polling", 1.5, 2);
        record_stream_reconnect();
    }
}
