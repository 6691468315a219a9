//! Configuration for the adaptive execution engine.
//!
//! YAML with `${VAR}` / `${VAR:-default}` environment interpolation. Every
//! field has a default, so an empty document is a valid configuration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use adaptive_execution::config::load_config;
//!
//! let config = load_config(Some("execution.yaml"))?;
//! let strategy = config.execution.to_strategy_config();
//! ```

mod broker;
mod execution;
mod monitor;
mod observability;
mod persistence;

use std::net::SocketAddr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::execution_tactics::{MarketTimingConfig, SpreadThresholds};
use crate::domain::position_sizing::SafeguardConfig;
use crate::infrastructure::broker::alpaca::AlpacaEnvironment;

pub use broker::{BrokerConfig, RetrySettings, StreamSettings};
pub use execution::ExecutionConfig;
pub use monitor::MonitorConfig;
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use persistence::{BlobStoreKind, PersistenceConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Repricing sequence.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Spread classification thresholds.
    #[serde(default)]
    pub spread: SpreadThresholds,
    /// Post-open timing window.
    #[serde(default)]
    pub timing: MarketTimingConfig,
    /// Share sizing safeguards.
    #[serde(default)]
    pub sizing: SafeguardConfig,
    /// Completion monitoring cadence.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Broker connectivity.
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Execution bookkeeping storage.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// `path` defaults to `config.yaml`.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    let config = load_config_from_string(&contents)?;
    tracing::info!(
        path,
        environment = %config.broker.environment,
        max_attempts = config.execution.max_attempts,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate `${VAR}` and `${VAR:-default}`; unset variables without a
/// default become empty.
#[allow(clippy::expect_used)] // Regex is compile-time constant
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

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` naming the first offending field.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let execution = &config.execution;
    if !execution.base_timeout_secs.is_finite() || execution.base_timeout_secs <= 0.0 {
        return Err(invalid("execution.base_timeout_secs must be positive"));
    }
    if execution.max_total_wait_secs == 0 {
        return Err(invalid("execution.max_total_wait_secs must be positive"));
    }
    execution
        .to_strategy_config()
        .validate()
        .map_err(|e| invalid(format!("execution: {e}")))?;

    let spread = &config.spread;
    if spread.urgent_max_cents <= Decimal::ZERO
        || spread.urgent_max_cents > spread.tight_max_cents
        || spread.tight_max_cents > spread.normal_max_cents
    {
        return Err(invalid(
            "spread cents thresholds must be positive and ordered urgent <= tight <= normal",
        ));
    }
    if spread.tight_max_bps <= Decimal::ZERO || spread.tight_max_bps > spread.normal_max_bps {
        return Err(invalid(
            "spread bps thresholds must be positive and ordered tight <= normal",
        ));
    }

    if config.timing.open_window_minutes > 390 {
        return Err(invalid("timing.open_window_minutes must fit in a session"));
    }

    if config.sizing.min_valid_price <= Decimal::ZERO {
        return Err(invalid("sizing.min_valid_price must be positive"));
    }
    if config.sizing.minimum_unit <= Decimal::ZERO {
        return Err(invalid("sizing.minimum_unit must be positive"));
    }

    if config.monitor.poll_interval_ms == 0 || config.monitor.backstop_interval_ms == 0 {
        return Err(invalid("monitor intervals must be positive"));
    }

    let broker = &config.broker;
    if broker.timeout_secs == 0 {
        return Err(invalid("broker.timeout_secs must be positive"));
    }
    if broker.retry.max_attempts == 0 {
        return Err(invalid("broker.retry.max_attempts must be at least 1"));
    }
    if broker.environment == AlpacaEnvironment::Live && !broker.has_credentials() {
        return Err(invalid("broker.api_key and broker.api_secret are required for live trading"));
    }

    let persistence = &config.persistence;
    if persistence.kind == BlobStoreKind::File && persistence.path.trim().is_empty() {
        return Err(invalid("persistence.path is required for the file store"));
    }
    if persistence.attempts_key.trim().is_empty() {
        return Err(invalid("persistence.attempts_key must not be empty"));
    }

    let logging = &config.observability.logging;
    let valid_formats = ["json", "pretty", "compact"];
    if !valid_formats.contains(&logging.format.as_str()) {
        return Err(invalid(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }
    let metrics = &config.observability.metrics;
    if metrics.enabled && metrics.listen_addr.parse::<SocketAddr>().is_err() {
        return Err(invalid(format!(
            "observability.metrics.listen_addr '{}' is not a socket address",
            metrics.listen_addr
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::execution_tactics::StrategyConfig;

    fn validation_message(yaml: &str) -> String {
        match load_config_from_string(yaml) {
            Err(ConfigError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_is_default() {
        let config = load_config_from_string("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.execution.to_strategy_config(), StrategyConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let yaml = r"
execution:
  max_attempts: 5
  base_timeout_secs: 2.5
spread:
  tight_max_cents: 2
monitor:
  poll_interval_ms: 250
";
        let config = load_config_from_string(yaml).unwrap();
        let strategy = config.execution.to_strategy_config();

        assert_eq!(strategy.max_attempts, 5);
        assert_eq!(strategy.base_timeout, Duration::from_millis(2_500));
        assert!((strategy.timeout_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.spread.tight_max_cents, dec!(2));
        assert_eq!(config.spread.normal_max_cents, dec!(5));
        assert_eq!(config.monitor.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.monitor.backstop_interval(), Duration::from_secs(5));
    }

    #[test]
    fn full_config_parse() {
        let yaml = r#"
execution:
  max_attempts: 4
  timeout_multiplier: 2.0
  price_improvement_ticks_per_attempt: 2
  enable_market_fallback: false
  tick_sizes:
    overrides:
      BRK.A: 1
timing:
  open_window_minutes: 10
  wide_spread_wait_secs: 60
sizing:
  min_valid_price: 0.05
broker:
  api_key: "key"
  api_secret: "secret"
  environment: live
  retry:
    max_attempts: 5
  stream:
    enabled: false
persistence:
  kind: file
  path: "/var/lib/execution"
observability:
  logging:
    level: "debug"
    format: "pretty"
  metrics:
    enabled: true
    listen_addr: "127.0.0.1:9100"
"#;
        let config = load_config_from_string(yaml).unwrap();

        assert_eq!(config.execution.max_attempts, 4);
        assert!(!config.execution.enable_market_fallback);
        assert_eq!(
            config.execution.tick_sizes.overrides.get("BRK.A"),
            Some(&dec!(1))
        );
        assert_eq!(config.timing.open_window_minutes, 10);
        assert_eq!(config.timing.wide_spread_wait_secs, 60);
        assert_eq!(config.sizing.min_valid_price, dec!(0.05));
        assert_eq!(config.broker.environment, AlpacaEnvironment::Live);
        assert_eq!(config.broker.retry.max_attempts, 5);
        assert!(config.broker.to_stream_config().is_none());
        assert_eq!(config.persistence.kind, BlobStoreKind::File);
        assert_eq!(config.observability.logging.level, "debug");
        assert!(config.observability.metrics.enabled);
    }

    #[test]
    fn env_var_with_default_when_missing() {
        let input = "level: ${ADAPTIVE_EXEC_TEST_NONEXISTENT_VAR:-warn}";
        assert_eq!(interpolate_env_vars(input), "level: warn");
    }

    #[test]
    fn env_var_without_default_becomes_empty() {
        let input = "api_key: \"${ADAPTIVE_EXEC_TEST_UNLIKELY_TO_EXIST}\"";
        assert_eq!(interpolate_env_vars(input), "api_key: \"\"");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)]
    fn env_var_uses_existing_value() {
        let result = interpolate_env_vars("path: ${PATH:-default}");
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn rejects_zero_attempts() {
        let msg = validation_message("execution:\n  max_attempts: 0\n");
        assert!(msg.contains("execution"));
    }

    #[test]
    fn rejects_negative_base_timeout() {
        let msg = validation_message("execution:\n  base_timeout_secs: -1\n");
        assert!(msg.contains("base_timeout_secs"));
    }

    #[test]
    fn rejects_unordered_spread_thresholds() {
        let msg = validation_message("spread:\n  tight_max_cents: 10\n  normal_max_cents: 5\n");
        assert!(msg.contains("spread"));
    }

    #[test]
    fn rejects_live_without_credentials() {
        let msg = validation_message("broker:\n  environment: live\n");
        assert!(msg.contains("live"));
    }

    #[test]
    fn rejects_unknown_log_format() {
        let msg = validation_message("observability:\n  logging:\n    format: xml\n");
        assert!(msg.contains("format"));
    }

    #[test]
    fn rejects_bad_metrics_address() {
        let msg = validation_message(
            "observability:\n  metrics:\n    enabled: true\n    listen_addr: nowhere\n",
        );
        assert!(msg.contains("listen_addr"));
    }

    #[test]
    fn missing_file_is_read_error() {
        assert!(matches!(
            load_config(Some("/nonexistent/adaptive-execution.yaml")),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "execution:\n  max_attempts: 7\n").unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.execution.max_attempts, 7);
    }
}
