//! Alpaca-specific error types.

use thiserror::Error;

use crate::application::ports::{GatewayError, PriceFeedError, mentions_insufficient_funds};

/// Errors from the Alpaca adapters.
#[derive(Debug, Error, Clone)]
pub enum AlpacaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// API returned an error.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code from the API.
        code: String,
        /// Error message from the API.
        message: String,
    },

    /// Order was rejected.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Account lacks buying power for the order.
    #[error("Insufficient buying power: {0}")]
    InsufficientBuyingPower(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Rate limited.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: u64,
    },

    /// Network error (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Max retries exceeded.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        /// Request path of the missing resource.
        resource: String,
    },
}

impl From<AlpacaError> for GatewayError {
    fn from(err: AlpacaError) -> Self {
        match err {
            AlpacaError::Http(msg) | AlpacaError::Network(msg) | AlpacaError::JsonParse(msg) => {
                Self::ConnectionError { message: msg }
            }
            AlpacaError::Api { code, message } => {
                if mentions_insufficient_funds(&message) {
                    Self::InsufficientFunds { message }
                } else if code == "400" {
                    Self::InvalidRequest { message }
                } else {
                    Self::Unknown {
                        message: format!("{code}: {message}"),
                    }
                }
            }
            AlpacaError::OrderRejected(reason) => Self::OrderRejected { reason },
            AlpacaError::InsufficientBuyingPower(message) => Self::InsufficientFunds { message },
            AlpacaError::AuthenticationFailed => Self::Unknown {
                message: "Authentication failed".to_string(),
            },
            AlpacaError::RateLimited { .. } => Self::RateLimited,
            AlpacaError::MaxRetriesExceeded { attempts } => Self::ConnectionError {
                message: format!("Max retries exceeded after {attempts} attempts"),
            },
            AlpacaError::NotFound { resource } => Self::OrderNotFound { order_id: resource },
        }
    }
}

impl From<AlpacaError> for PriceFeedError {
    fn from(err: AlpacaError) -> Self {
        match err {
            AlpacaError::NotFound { resource } => Self::UnknownSymbol { symbol: resource },
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_execution::ErrorKind;

    #[test]
    fn http_error_is_connection_error() {
        let err: GatewayError = AlpacaError::Http("connection refused".to_string()).into();
        assert!(matches!(err, GatewayError::ConnectionError { .. }));
        assert_eq!(err.kind(), ErrorKind::Unclassified);
    }

    #[test]
    fn buying_power_maps_to_insufficient_funds() {
        let err: GatewayError =
            AlpacaError::InsufficientBuyingPower("insufficient buying power".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn api_error_mentioning_funds_maps_to_insufficient_funds() {
        let err: GatewayError = AlpacaError::Api {
            code: "40310000".to_string(),
            message: "insufficient buying power".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::InsufficientFunds { .. }));
    }

    #[test]
    fn rejection_maps_to_gateway_rejection() {
        let err: GatewayError = AlpacaError::OrderRejected("market closed".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::GatewayRejection);
    }

    #[test]
    fn rate_limited() {
        let err: GatewayError = AlpacaError::RateLimited {
            retry_after_secs: 60,
        }
        .into();
        assert!(matches!(err, GatewayError::RateLimited));
    }

    #[test]
    fn not_found_for_price_feed() {
        let err: PriceFeedError = AlpacaError::NotFound {
            resource: "/v2/stocks/ZZZZ/quotes/latest".to_string(),
        }
        .into();
        assert!(matches!(err, PriceFeedError::UnknownSymbol { .. }));
    }
}
