//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Filter used when `RUST_LOG` is not set.
fn default_directives(config: &LoggingConfig) -> String {
    format!("trading_engine={},tower_http=info", config.level)
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}
