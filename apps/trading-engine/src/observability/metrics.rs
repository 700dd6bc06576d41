//! Prometheus metrics for the trading engine.
//!
//! | Metric | Labels |
//! |--------|--------|
//! | `orders_executed_total` | `mode`, `status` |
//! | `orders_rejected_total` | `mode`, `reason` |
//! | `order_execution_seconds` | `mode` |
//! | `gateway_retries_total` | `operation` |
//! | `mode_transitions_total` | `to` |
//! | `emergency_dry_run_total` | |
//!
//! Without an installed recorder every `record_*` call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsConfig;
use crate::domain::trading_mode::TradingMode;

/// Histogram buckets for execution latency, 1ms to 30s.
const LATENCY_BUCKETS: [f64; 10] = [0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0, 30.0];

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

/// Install the Prometheus exporter if metrics are enabled.
///
/// Serves `/metrics` on `listen_addr`. Must run inside a tokio runtime.
///
/// # Errors
///
/// Returns an error if the address is invalid or the listener cannot start.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        tracing::debug!("Metrics exporter disabled");
        return Ok(());
    }

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .map_err(|e| MetricsError::Configuration(format!("{}: {e}", config.listen_addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(&LATENCY_BUCKETS)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    describe();
    tracing::info!(%addr, "Prometheus metrics exporter started");
    Ok(())
}

fn describe() {
    describe_counter!("orders_executed_total", "Orders that reached a gateway");
    describe_counter!(
        "orders_rejected_total",
        "Orders rejected before placement or failed at the gateway"
    );
    describe_histogram!(
        "order_execution_seconds",
        "Wall time of execute() for orders that reached a gateway"
    );
    describe_counter!("gateway_retries_total", "Retried gateway calls");
    describe_counter!("mode_transitions_total", "Committed trading mode transitions");
    describe_counter!("emergency_dry_run_total", "Emergency dry-run activations");
}

/// Record an order that a gateway accepted, filled, or rejected.
pub fn record_order_executed(mode: TradingMode, status: &'static str, latency_seconds: f64) {
    counter!(
        "orders_executed_total",
        "mode" => mode.as_str(),
        "status" => status
    )
    .increment(1);

    histogram!("order_execution_seconds", "mode" => mode.as_str()).record(latency_seconds);
}

/// Record an order that failed validation or could not be placed.
///
/// # Arguments
///
/// * `mode` - Mode captured at the start of the execution
/// * `reason` - Stable error reason (e.g. `"INSUFFICIENT_FUNDS"`)
pub fn record_order_rejection(mode: TradingMode, reason: &'static str) {
    counter!(
        "orders_rejected_total",
        "mode" => mode.as_str(),
        "reason" => reason
    )
    .increment(1);
}

/// Record a retried gateway call.
pub fn record_gateway_retry(operation: &'static str) {
    counter!("gateway_retries_total", "operation" => operation).increment(1);
}

/// Record a committed mode transition.
pub fn record_mode_transition(to: TradingMode) {
    counter!("mode_transitions_total", "to" => to.as_str()).increment(1);
}

/// Record an emergency dry-run activation.
pub fn record_emergency_dry_run() {
    counter!("emergency_dry_run_total").increment(1);
    record_mode_transition(TradingMode::DryRun);
}
