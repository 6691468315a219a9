//! Broker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::execution::default_true;
use crate::infrastructure::broker::alpaca::{AlpacaConfig, AlpacaEnvironment, RetryConfig};
use crate::infrastructure::websocket::TradeStreamConfig;

/// The `broker` section (Alpaca).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// API secret.
    #[serde(default)]
    pub api_secret: String,
    /// `paper` or `live`.
    #[serde(default)]
    pub environment: AlpacaEnvironment,
    /// Replaces both REST base URLs (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    /// HTTP timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// REST retry policy.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Trade update stream.
    #[serde(default)]
    pub stream: StreamSettings,
}

impl BrokerConfig {
    /// Whether both credentials are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// REST adapter configuration.
    #[must_use]
    pub fn to_alpaca_config(&self) -> AlpacaConfig {
        let config = AlpacaConfig::new(
            self.api_key.clone(),
            self.api_secret.clone(),
            self.environment,
        )
        .with_timeout(Duration::from_secs(self.timeout_secs))
        .with_retry(self.retry.to_retry_config());

        match &self.base_url {
            Some(url) => config.with_base_url(url.clone()),
            None => config,
        }
    }

    /// Stream configuration, or `None` when streaming is off or credentials
    /// are missing.
    #[must_use]
    pub fn to_stream_config(&self) -> Option<TradeStreamConfig> {
        if !self.stream.enabled || !self.has_credentials() {
            return None;
        }

        let mut config = TradeStreamConfig::new(
            self.api_key.clone(),
            self.api_secret.clone(),
            self.environment,
        );
        config.initial_backoff = Duration::from_millis(self.stream.initial_backoff_ms);
        config.max_backoff = Duration::from_millis(self.stream.max_backoff_ms);
        config.max_reconnect_attempts = self.stream.max_reconnect_attempts;
        if let Some(url) = &self.stream.url {
            config = config.with_url(url.clone());
        }
        Some(config)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            environment: AlpacaEnvironment::Paper,
            base_url: None,
            timeout_secs: default_timeout_secs(),
            retry: RetrySettings::default(),
            stream: StreamSettings::default(),
        }
    }
}

/// REST retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts, the first one included.
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    /// First backoff, in milliseconds.
    #[serde(default = "default_retry_initial_ms")]
    pub initial_backoff_ms: u64,
    /// Backoff cap, in milliseconds.
    #[serde(default = "default_retry_max_ms")]
    pub max_backoff_ms: u64,
}

impl RetrySettings {
    fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            ..RetryConfig::default()
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            initial_backoff_ms: default_retry_initial_ms(),
            max_backoff_ms: default_retry_max_ms(),
        }
    }
}

/// Trade update stream settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Use push updates when credentials are available.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Replaces the environment's stream URL.
    #[serde(default)]
    pub url: Option<String>,
    /// First reconnect backoff, in milliseconds.
    #[serde(default = "default_stream_initial_ms")]
    pub initial_backoff_ms: u64,
    /// Reconnect backoff cap, in milliseconds.
    #[serde(default = "default_stream_max_ms")]
    pub max_backoff_ms: u64,
    /// Reconnects before giving up.
    #[serde(default = "default_stream_reconnects")]
    pub max_reconnect_attempts: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            initial_backoff_ms: default_stream_initial_ms(),
            max_backoff_ms: default_stream_max_ms(),
            max_reconnect_attempts: default_stream_reconnects(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_retry_initial_ms() -> u64 {
    100
}

const fn default_retry_max_ms() -> u64 {
    10_000
}

const fn default_stream_initial_ms() -> u64 {
    500
}

const fn default_stream_max_ms() -> u64 {
    60_000
}

const fn default_stream_reconnects() -> u32 {
    10
}
