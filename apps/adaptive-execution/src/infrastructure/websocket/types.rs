//! Trade Update Stream Types and Configuration

use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::broker::alpaca::{AlpacaConfig, AlpacaEnvironment};

/// Trade update stream configuration.
#[derive(Debug, Clone)]
pub struct TradeStreamConfig {
    /// API key for authentication.
    pub api_key: String,
    /// API secret for authentication.
    pub api_secret: String,
    /// Trading environment (Paper or Live).
    pub environment: AlpacaEnvironment,
    /// Trade updates websocket URL; the environment's by default.
    pub url: String,

    /// Initial backoff duration for reconnection.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth.
    pub backoff_multiplier: f64,
    /// Maximum reconnection attempts before giving up.
    pub max_reconnect_attempts: u32,

    /// How long to wait for the auth and listen replies.
    pub handshake_timeout: Duration,
}

impl TradeStreamConfig {
    /// Create a new configuration with sensible defaults.
    #[must_use]
    pub fn new(api_key: String, api_secret: String, environment: AlpacaEnvironment) -> Self {
        Self {
            api_key,
            api_secret,
            environment,
            url: environment.stream_url(),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            max_reconnect_attempts: 10,
            handshake_timeout: Duration::from_secs(10),
        }
    }

    /// Build from the broker configuration's credentials and environment.
    #[must_use]
    pub fn from_alpaca(config: &AlpacaConfig) -> Self {
        Self::new(
            config.api_key.clone(),
            config.api_secret.clone(),
            config.environment,
        )
    }

    /// Point the stream at a custom URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Trade updates WebSocket URL.
    #[must_use]
    pub fn trade_updates_url(&self) -> &str {
        &self.url
    }
}

/// Connection state of the trade update stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// Not connected.
    #[default]
    Disconnected,
    /// TCP/TLS handshake in progress.
    Connecting,
    /// Socket open, auth not yet confirmed.
    Authenticating,
    /// Authenticated and listening to `trade_updates`.
    Listening,
    /// Shut down; will not reconnect.
    Stopped,
}

impl StreamState {
    /// Whether updates are currently flowing.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Listening)
    }
}

/// Trade event type reported on the `trade_updates` stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeEvent {
    /// Order routed to the exchange.
    New,
    /// Order partially filled.
    PartialFill,
    /// Order completely filled.
    Fill,
    /// Order canceled.
    Canceled,
    /// Order expired.
    Expired,
    /// Order done for the trading day.
    DoneForDay,
    /// Order replaced by another.
    Replaced,
    /// Order rejected.
    Rejected,
    /// Cancel requested, not yet confirmed.
    PendingCancel,
    /// Order received but not yet routed.
    PendingNew,
    /// Order accepted by the broker.
    Accepted,
    /// Any other event.
    Other,
}

impl TradeEvent {
    /// Parse from the wire event name.
    #[must_use]
    pub fn from_alpaca_event(s: &str) -> Self {
        match s {
            "new" => Self::New,
            "partial_fill" => Self::PartialFill,
            "fill" => Self::Fill,
            "canceled" => Self::Canceled,
            "expired" => Self::Expired,
            "done_for_day" => Self::DoneForDay,
            "replaced" => Self::Replaced,
            "rejected" => Self::Rejected,
            "pending_cancel" => Self::PendingCancel,
            "pending_new" => Self::PendingNew,
            "accepted" => Self::Accepted,
            _ => Self::Other,
        }
    }

    /// Events after which the order will not change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Fill
                | Self::Canceled
                | Self::Expired
                | Self::DoneForDay
                | Self::Replaced
                | Self::Rejected
        )
    }
}

/// Trade update stream errors.
#[derive(Debug, Clone, Error)]
pub enum WebSocketError {
    /// Connection failed.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error details.
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Error details.
        message: String,
    },

    /// Listen request rejected or unanswered.
    #[error("Listen failed: {message}")]
    ListenFailed {
        /// Error details.
        message: String,
    },

    /// Send failed.
    #[error("Send failed: {message}")]
    SendFailed {
        /// Error details.
        message: String,
    },

    /// Message parse error.
    #[error("Parse error: {message}")]
    ParseError {
        /// Error details.
        message: String,
    },

    /// Handshake step timed out.
    #[error("Timeout during {operation}")]
    Timeout {
        /// Operation that timed out.
        operation: String,
    },

    /// Connection closed by the peer.
    #[error("Connection closed: {reason}")]
    ConnectionClosed {
        /// Close reason.
        reason: String,
    },
}
