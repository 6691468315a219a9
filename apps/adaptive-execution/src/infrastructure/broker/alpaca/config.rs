//! Alpaca adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DATA_URL: &str = "https://data.alpaca.markets";

/// Paper or live account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlpacaEnvironment {
    /// Simulated fills against live quotes.
    #[default]
    Paper,
    /// Real money.
    Live,
}

impl AlpacaEnvironment {
    /// Lowercase name, as written in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Live => "live",
        }
    }

    const fn trading_host(self) -> &'static str {
        match self {
            Self::Paper => "paper-api.alpaca.markets",
            Self::Live => "api.alpaca.markets",
        }
    }

    /// Default REST and stream endpoints for this account type.
    #[must_use]
    pub fn endpoints(self) -> AlpacaEndpoints {
        let host = self.trading_host();
        AlpacaEndpoints {
            trading: format!("https://{host}"),
            data: DATA_URL.to_string(),
            stream: format!("wss://{host}/stream"),
        }
    }

    /// Trade updates websocket URL.
    #[must_use]
    pub fn stream_url(self) -> String {
        self.endpoints().stream
    }

    /// Returns true for real-money trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

impl std::fmt::Display for AlpacaEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs of the trading API, the market data API and the trade stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlpacaEndpoints {
    /// Orders, positions and assets.
    pub trading: String,
    /// Quotes and trades.
    pub data: String,
    /// `trade_updates` websocket.
    pub stream: String,
}

/// Credentials, endpoints and HTTP behaviour for the REST adapters.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    /// API key id.
    pub api_key: String,
    /// API secret key.
    pub api_secret: String,
    /// Account type.
    pub environment: AlpacaEnvironment,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Backoff for transient failures.
    pub retry: RetryConfig,
    /// Where requests go.
    pub endpoints: AlpacaEndpoints,
}

impl AlpacaConfig {
    /// Configuration with the environment's default endpoints, a 30s timeout
    /// and the default retry policy.
    #[must_use]
    pub fn new(api_key: String, api_secret: String, environment: AlpacaEnvironment) -> Self {
        Self {
            api_key,
            api_secret,
            environment,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            endpoints: environment.endpoints(),
        }
    }

    /// Replace the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Send trading and data requests to `url` (proxies, mock servers).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.endpoints.data.clone_from(&url);
        self.endpoints.trading = url;
        self
    }

    /// Returns true if both credentials are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }

    /// Trading API base URL.
    #[must_use]
    pub fn trading_base_url(&self) -> &str {
        &self.endpoints.trading
    }

    /// Market data API base URL.
    #[must_use]
    pub fn data_base_url(&self) -> &str {
        &self.endpoints.data
    }
}

/// Exponential backoff for transient HTTP failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts per request, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Growth factor between delays.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper() -> AlpacaConfig {
        AlpacaConfig::new("key".to_string(), "secret".to_string(), AlpacaEnvironment::Paper)
    }

    #[test]
    fn endpoints_follow_environment() {
        let paper = AlpacaEnvironment::Paper.endpoints();
        assert_eq!(paper.trading, "https://paper-api.alpaca.markets");
        assert_eq!(paper.stream, "wss://paper-api.alpaca.markets/stream");

        let live = AlpacaEnvironment::Live.endpoints();
        assert_eq!(live.trading, "https://api.alpaca.markets");
        assert_eq!(live.data, paper.data);
        assert!(AlpacaEnvironment::Live.is_live());
    }

    #[test]
    fn base_url_redirects_both_rest_apis() {
        let config = paper().with_base_url("http://127.0.0.1:9000");
        assert_eq!(config.trading_base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.data_base_url(), "http://127.0.0.1:9000");
        assert!(config.endpoints.stream.starts_with("wss://paper"));
    }

    #[test]
    fn credentials_presence() {
        assert!(paper().has_credentials());
        let empty = AlpacaConfig::new(String::new(), "secret".to_string(), AlpacaEnvironment::Paper);
        assert!(!empty.has_credentials());
    }

    #[test]
    fn environment_parses_lowercase() {
        let env: AlpacaEnvironment = serde_json::from_str("\"live\"").unwrap();
        assert_eq!(env, AlpacaEnvironment::Live);
        assert_eq!(env.to_string(), "live");
    }
}
