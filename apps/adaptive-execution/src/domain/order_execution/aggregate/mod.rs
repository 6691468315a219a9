//! Order Aggregate
//!
//! Local snapshot of broker orders.

mod order;

pub use order::Order;
