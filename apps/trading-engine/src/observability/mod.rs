//! Observability module for logging and metrics.
//!
//! Structured logging goes through `tracing`; counters and the execution
//! latency histogram go through the `metrics` facade and are exported to
//! Prometheus when enabled.

mod logging;
mod metrics;

pub use logging::init_tracing;
pub use self::metrics::{
    MetricsError, init_metrics, record_emergency_dry_run, record_gateway_retry,
    record_mode_transition, record_order_executed, record_order_rejection,
};
