//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `broker/`: Alpaca REST order gateway and an in-memory simulated broker
//! - `price_feed/`: Alpaca latest quote/trade source and a scripted mock
//! - `websocket/`: Alpaca trade update stream with reconnect and routing
//! - `persistence/`: Blob stores for execution attempt records
//! - `config/`: Dependency injection container

pub mod broker;
pub mod config;
pub mod persistence;
pub mod price_feed;
pub mod websocket;
