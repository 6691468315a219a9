//! Observability module for logging and metrics.
//!
//! Structured `tracing` output with an `EnvFilter`, and Prometheus counters
//! and histograms for order submissions, repegs, fallbacks, outcomes and
//! completion waits.

mod metrics;
mod tracing;

pub use self::metrics::{
    MetricsConfig, MetricsError, init_metrics, record_completion_wait, record_execution_outcome,
    record_idempotent_skip, record_market_fallback, record_order_submission, record_repeg,
    record_stream_reconnect,
};
pub use self::tracing::{TracingError, env_filter, init_tracing};
