//! Order Update Stream Infrastructure
//!
//! Push delivery of order status changes over the Alpaca `trade_updates`
//! WebSocket:
//!
//! - `wss://paper-api.alpaca.markets/stream` (paper)
//! - `wss://api.alpaca.markets/stream` (live)
//!
//! # Architecture
//!
//! - [`TradeUpdateStream`]: one shared connection with auth/listen handshake
//!   and jittered reconnects
//! - [`OrderUpdateRouter`]: fans updates out to per-order waiters
//! - [`ReconnectPolicy`]: exponential backoff with full jitter
//! - [`InMemoryOrderStream`]: socket-free stand-in for tests

mod codec;
mod in_memory;
mod manager;
mod reconnect;
mod router;
mod types;

pub use codec::{StreamMessage, auth_message, decode_message, listen_message};
pub use in_memory::InMemoryOrderStream;
pub use manager::TradeUpdateStream;
pub use reconnect::ReconnectPolicy;
pub use router::OrderUpdateRouter;
pub use types::{StreamState, TradeEvent, TradeStreamConfig, WebSocketError};
