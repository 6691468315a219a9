//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.

mod execute_trade;

pub use execute_trade::{ExecuteTradeUseCase, ExecutionPhase};
