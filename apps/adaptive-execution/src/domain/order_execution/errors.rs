//! Execution error taxonomy.
//!
//! Every failure the orchestrator reports carries an [`ErrorKind`]; the kind,
//! not the message, decides whether a market-order fallback is allowed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Category of an execution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid request (empty symbol, non-positive quantity, bad config).
    Input,
    /// No usable quote for the symbol.
    PriceUnavailable,
    /// Broker refused the order for lack of buying power.
    InsufficientFunds,
    /// Broker refused the order for any other reason.
    GatewayRejection,
    /// The spread widened past the volatility threshold mid-sequence.
    VolatilityPause,
    /// Limit attempts ran out, or an order could not be confirmed in time.
    Timeout,
    /// Idempotency bookkeeping failed.
    Persistence,
    /// Anything not covered above.
    Unclassified,
}

impl ErrorKind {
    /// Whether a failure of this kind may be retried once as a market order.
    #[must_use]
    pub const fn allows_market_fallback(&self) -> bool {
        !matches!(
            self,
            Self::Input | Self::InsufficientFunds | Self::Persistence
        )
    }

    /// Snake-case name, used as a metrics label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::PriceUnavailable => "price_unavailable",
            Self::InsufficientFunds => "insufficient_funds",
            Self::GatewayRejection => "gateway_rejection",
            Self::VolatilityPause => "volatility_pause",
            Self::Timeout => "timeout",
            Self::Persistence => "persistence",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized execution failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExecutionError {
    /// Failure category.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl ExecutionError {
    /// Create an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Invalid request.
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    /// No usable quote.
    #[must_use]
    pub fn price_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PriceUnavailable, message)
    }

    /// Spread blew out mid-sequence.
    #[must_use]
    pub fn volatility_pause(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::VolatilityPause, message)
    }

    /// Sequence ran out of time or attempts.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Whether this failure may be retried once as a market order.
    #[must_use]
    pub const fn allows_market_fallback(&self) -> bool {
        self.kind.allows_market_fallback()
    }
}

impl From<DomainError> for ExecutionError {
    fn from(err: DomainError) -> Self {
        Self::input(err.to_string())
    }
}
