//! Configuration Module
//!
//! YAML configuration for the trading engine with environment variable
//! interpolation.
//!
//! # Example
//!
//! ```yaml
//! server:
//!   http_port: 8000
//!
//! trading:
//!   initial_mode: dry_run
//!
//! exchange:
//!   api_key: ${BITVAVO_API_KEY}
//!   api_secret: ${BITVAVO_API_SECRET}
//!
//! observability:
//!   logging:
//!     level: ${LOG_LEVEL:-info}
//!     format: pretty
//! ```
//!
//! A missing `config.yaml` falls back to the bundled defaults, which read
//! the same environment variables. An explicitly requested file (argument
//! or `TRADING_ENGINE_CONFIG`) must exist.

mod exchange;
mod observability;
mod retry;
mod risk;
mod server;
mod simulation;
mod trading;

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use exchange::ExchangeConfig;
pub use observability::{LogFormat, LoggingConfig, MetricsConfig, ObservabilityConfig};
pub use retry::RetryConfig;
pub use risk::RiskConfig;
pub use server::ServerConfig;
pub use simulation::SimulationConfig;
pub use trading::TradingConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "TRADING_ENGINE_CONFIG";

/// File read when neither an argument nor `TRADING_ENGINE_CONFIG` names one.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration used when the default file does not exist.
pub const BUNDLED_CONFIG: &str = include_str!("../../config.yaml");

// ============================================
// Error Types
// ============================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Start-up mode and journal.
    #[serde(default)]
    pub trading: TradingConfig,
    /// Dry-run and demo simulators.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Per-mode risk limits.
    #[serde(default)]
    pub risk: RiskConfig,
    /// Gateway retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Real exchange connection and credentials.
    #[serde(default)]
    pub exchange: ExchangeConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration with environment variable interpolation.
///
/// `path` wins over `TRADING_ENGINE_CONFIG`. Without either, `config.yaml`
/// is read if present and the bundled defaults are used otherwise.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let explicit = path
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.is_empty()));

    let (path, contents) = match explicit {
        Some(path) => {
            let contents = read(&path)?;
            (path, contents)
        }
        None => match std::fs::read_to_string(DEFAULT_CONFIG_PATH) {
            Ok(contents) => (DEFAULT_CONFIG_PATH.to_string(), contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ("<bundled>".to_string(), BUNDLED_CONFIG.to_string())
            }
            Err(e) => {
                return Err(ConfigError::ReadError {
                    path: DEFAULT_CONFIG_PATH.to_string(),
                    source: e,
                });
            }
        },
    };

    tracing::debug!(%path, "Loading configuration");
    load_config_from_string(&contents)
}

fn read(path: &str) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. An unset or empty
/// variable without a default becomes the empty string.
#[allow(clippy::expect_used)] // Regex is a compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

    if config.trading.initial_mode.is_live() {
        return invalid(
            "trading.initial_mode cannot be live; switch to live at runtime after credential validation"
                .to_string(),
        );
    }

    if config.trading.journal_capacity == 0 {
        return invalid("trading.journal_capacity must be positive".to_string());
    }

    for (name, limits) in [
        ("dry_run", &config.risk.dry_run),
        ("demo", &config.risk.demo),
        ("live", &config.risk.live),
    ] {
        if limits.max_trade_amount <= rust_decimal::Decimal::ZERO {
            return invalid(format!("risk.{name}.max_trade_amount must be positive"));
        }
        if limits.max_open_orders == 0 {
            return invalid(format!("risk.{name}.max_open_orders must be positive"));
        }
    }

    let minimums = &config.risk.minimum_order_sizes;
    if minimums.default.is_sign_negative()
        || minimums.markets.values().any(|v| v.is_sign_negative())
    {
        return invalid("risk.minimum_order_sizes must not be negative".to_string());
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        return invalid("retry.max_attempts must be at least 1".to_string());
    }
    if retry.multiplier.is_nan() || retry.multiplier < 1.0 {
        return invalid("retry.multiplier must be at least 1.0".to_string());
    }
    if !(0.0..=1.0).contains(&retry.jitter_factor) {
        return invalid("retry.jitter_factor must be between 0.0 and 1.0".to_string());
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        return invalid("retry.initial_backoff_ms must not exceed retry.max_backoff_ms".to_string());
    }

    let simulation = &config.simulation;
    if simulation.fee_rate.is_sign_negative() {
        return invalid("simulation.fee_rate must not be negative".to_string());
    }
    if let Some((market, _)) = simulation
        .reference_prices
        .iter()
        .find(|(_, price)| **price <= rust_decimal::Decimal::ZERO)
    {
        return invalid(format!("simulation.reference_prices.{market} must be positive"));
    }
    if simulation.starting_balances.values().any(|v| v.is_sign_negative()) {
        return invalid("simulation.starting_balances must not be negative".to_string());
    }

    let exchange = &config.exchange;
    if !exchange.base_url.starts_with("http://") && !exchange.base_url.starts_with("https://") {
        return invalid("exchange.base_url must be an http(s) URL".to_string());
    }
    if exchange.timeout_secs == 0 {
        return invalid("exchange.timeout_secs must be positive".to_string());
    }

    if config.server.listen_addr().parse::<SocketAddr>().is_err() {
        return invalid(format!(
            "server address '{}' is not a valid socket address",
            config.server.listen_addr()
        ));
    }

    let metrics = &config.observability.metrics;
    if metrics.enabled && metrics.listen_addr.parse::<SocketAddr>().is_err() {
        return invalid(format!(
            "observability.metrics.listen_addr '{}' is not a valid socket address",
            metrics.listen_addr
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::trading_mode::TradingMode;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.http_port, 8000);
        assert_eq!(config.trading.initial_mode, TradingMode::DryRun);
        assert_eq!(config.simulation.fee_rate, dec!(0.0025));
        assert_eq!(config.simulation.demo_max_slippage_bps, 25);
        assert_eq!(config.risk.live.max_trade_amount, dec!(10000));
        assert_eq!(config.risk.demo.max_open_orders, 50);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.exchange.credentials().is_none());
        assert!(!config.observability.metrics.enabled);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let config = match load_config_from_string(BUNDLED_CONFIG) {
            Ok(c) => c,
            Err(e) => panic!("bundled config should load: {e}"),
        };
        assert_eq!(config.trading.initial_mode, TradingMode::DryRun);
        assert_eq!(config.exchange.base_url, "https://api.bitvavo.com/v2");
    }

    #[test]
    fn test_load_minimal_config() {
        let yaml = r"
server:
  http_port: 8080
";

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load minimal config: {e}"),
        };
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.retry.initial_backoff_ms, 100);
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "level: ${TRADING_ENGINE_TEST_NONEXISTENT_VAR:-debug}";
        assert_eq!(interpolate_env_vars(input), "level: debug");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "api_key: ${TRADING_ENGINE_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "api_key: ");
    }

    #[test]
    fn test_missing_credentials_are_not_configured() {
        let yaml = r#"
exchange:
  api_key: "${TRADING_ENGINE_TEST_UNLIKELY_KEY}"
  api_secret: "secret"
"#;
        let config = load_config_from_string(yaml).unwrap();
        assert!(config.exchange.credentials().is_none());
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let yaml = r"
exchange:
  api_key: abcdefgh
  api_secret: topsecret
";
        let config = load_config_from_string(yaml).unwrap();
        let rendered = format!("{:?}", config.exchange);
        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("abcdefgh"));
        assert!(rendered.contains("abcd***"));
    }

    #[test]
    fn test_validation_rejects_live_start() {
        let yaml = r"
trading:
  initial_mode: live
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for live initial mode");
        };
        assert!(err.to_string().contains("initial_mode"));
    }

    #[test]
    fn test_demo_start_is_accepted() {
        let config = load_config_from_string("trading:\n  initial_mode: demo\n").unwrap();
        assert_eq!(config.trading.initial_mode, TradingMode::Demo);
    }

    #[test]
    fn test_validation_rejects_non_positive_risk_limit() {
        let yaml = r"
risk:
  live:
    max_trade_amount: 0
    max_open_orders: 10
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for zero trade amount");
        };
        assert!(err.to_string().contains("risk.live.max_trade_amount"));
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let Err(err) = load_config_from_string("retry:\n  max_attempts: 0\n") else {
            panic!("expected error for zero attempts");
        };
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_validation_rejects_shrinking_multiplier() {
        let Err(err) = load_config_from_string("retry:\n  multiplier: 0.5\n") else {
            panic!("expected error for multiplier below 1");
        };
        assert!(err.to_string().contains("multiplier"));
    }

    #[test]
    fn test_validation_rejects_jitter_out_of_range() {
        let Err(err) = load_config_from_string("retry:\n  jitter_factor: 1.5\n") else {
            panic!("expected error for jitter");
        };
        assert!(err.to_string().contains("jitter_factor"));
    }

    #[test]
    fn test_validation_rejects_negative_fee() {
        let Err(err) = load_config_from_string("simulation:\n  fee_rate: -0.01\n") else {
            panic!("expected error for negative fee");
        };
        assert!(err.to_string().contains("fee_rate"));
    }

    #[test]
    fn test_validation_rejects_zero_reference_price() {
        let yaml = r"
simulation:
  reference_prices:
    BTC-EUR: 0
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for zero price");
        };
        assert!(err.to_string().contains("BTC-EUR"));
    }

    #[test]
    fn test_validation_rejects_bad_metrics_addr() {
        let yaml = r"
observability:
  metrics:
    enabled: true
    listen_addr: not-an-address
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for metrics address");
        };
        assert!(err.to_string().contains("listen_addr"));
    }

    #[test]
    fn test_unknown_log_format_is_a_parse_error() {
        let yaml = r"
observability:
  logging:
    format: xml
";
        assert!(matches!(
            load_config_from_string(yaml),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
server:
  bind_address: "127.0.0.1"
  http_port: 9100

trading:
  initial_mode: demo
  journal_capacity: 500

simulation:
  starting_balances:
    EUR: 2500
    BTC: 0.5
  reference_prices:
    BTC-EUR: 42000
  fee_rate: 0.001
  demo_max_slippage_bps: 10

risk:
  dry_run:
    max_trade_amount: 5000
    max_open_orders: 5
  live:
    max_trade_amount: 250
    max_open_orders: 2
  minimum_order_sizes:
    default: 0.01
    markets:
      BTC-EUR: 0.0001

retry:
  max_attempts: 5
  initial_backoff_ms: 50
  max_backoff_ms: 1000
  multiplier: 1.5
  jitter_factor: 0.1

exchange:
  base_url: "http://localhost:9999/v2"
  timeout_secs: 5
  api_key: key
  api_secret: secret
  verify_credentials: false

observability:
  logging:
    level: debug
    format: pretty
  metrics:
    enabled: true
    listen_addr: "127.0.0.1:9464"
"#;

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load full config: {e}"),
        };

        assert_eq!(config.server.listen_addr(), "127.0.0.1:9100");
        assert_eq!(config.trading.initial_mode, TradingMode::Demo);
        assert_eq!(config.trading.journal_capacity, 500);
        assert_eq!(config.simulation.starting_balances["BTC"], dec!(0.5));
        assert_eq!(config.simulation.reference_prices["BTC-EUR"], dec!(42000));
        assert_eq!(config.risk.dry_run.max_open_orders, 5);
        assert_eq!(config.risk.demo.max_trade_amount, dec!(100000));
        assert_eq!(config.risk.mode_limits().live.max_trade_amount, dec!(250));
        assert_eq!(
            config.risk.minimum_order_sizes.for_market(&"BTC-EUR".parse().unwrap()),
            dec!(0.0001)
        );
        let policy = config.retry.policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, std::time::Duration::from_millis(50));
        assert!(config.exchange.credentials().is_some());
        assert!(!config.exchange.verify_credentials);
        assert_eq!(config.observability.logging.format, LogFormat::Pretty);
        assert_eq!(config.observability.metrics.listen_addr, "127.0.0.1:9464");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  http_port: 8123").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.http_port, 8123);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        let Err(err) = load_config(path.to_str()) else {
            panic!("expected read error");
        };
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }
}
