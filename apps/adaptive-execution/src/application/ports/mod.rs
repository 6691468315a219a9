//! Application Ports (Driven)
//!
//! Ports define interfaces for the external systems the engine drives:
//! the broker, market data, the order update stream and blob persistence.

mod blob_store_port;
mod clock_port;
mod order_gateway_port;
mod order_stream_port;
mod quote_source_port;

pub use blob_store_port::{BlobStoreError, BlobStorePort};
pub use clock_port::{ClockPort, FixedClock, SystemClock};
pub use order_gateway_port::{
    GatewayError, OrderGatewayPort, SubmitOrderRequest, mentions_insufficient_funds,
};
pub use order_stream_port::{OrderUpdate, OrderUpdateStreamPort, OrderUpdateSubscription, StreamError};
pub use quote_source_port::{PriceFeedError, Quote, QuoteSourcePort};
