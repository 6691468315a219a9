//! Broker Adapters
//!
//! Implementations of `OrderGatewayPort`.

pub mod alpaca;
mod in_memory;

pub use alpaca::{AlpacaConfig, AlpacaEnvironment, AlpacaError, AlpacaGateway};
pub use in_memory::{FillRule, InMemoryGateway};
