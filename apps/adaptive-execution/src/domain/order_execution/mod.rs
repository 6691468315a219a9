//! Order Execution Bounded Context
//!
//! Order snapshots, order vocabulary and the execution result and error
//! types the orchestrator reports.

pub mod aggregate;
pub mod errors;
pub mod value_objects;

pub use aggregate::Order;
pub use errors::{ErrorKind, ExecutionError};
pub use value_objects::{
    ExecutionResult, OrderSide, OrderSize, OrderStatus, OrderType, TimeInForce,
};
