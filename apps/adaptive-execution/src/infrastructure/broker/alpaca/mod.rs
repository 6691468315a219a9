//! Alpaca Markets Adapters
//!
//! REST integration for the Alpaca trading and market data APIs with:
//! - Retry logic with exponential backoff
//! - Environment-aware warnings (paper vs live)
//! - Broker payloads normalized into domain orders

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::AlpacaGateway;
pub(crate) use api_types::{parse_optional_decimal, parse_order_status};
pub use config::{AlpacaConfig, AlpacaEndpoints, AlpacaEnvironment, RetryConfig};
pub use error::AlpacaError;
pub use http_client::{AlpacaApi, AlpacaHttpClient};
