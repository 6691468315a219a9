//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless business logic
//!
//! # Bounded Contexts
//!
//! - [`order_execution`]: Order snapshots, execution results and error taxonomy
//! - [`execution_tactics`]: Repricing, tick resolution, spread and timing analysis
//! - [`position_sizing`]: Safe share quantities from dollar trade amounts

pub mod execution_tactics;
pub mod order_execution;
pub mod position_sizing;
pub mod shared;
