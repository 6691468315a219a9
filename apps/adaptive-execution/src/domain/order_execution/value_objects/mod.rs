//! Order Execution Value Objects

mod execution_result;
mod order_size;
mod order_status;
mod order_terms;

pub use execution_result::ExecutionResult;
pub use order_size::OrderSize;
pub use order_status::OrderStatus;
pub use order_terms::{OrderSide, OrderType, TimeInForce};
