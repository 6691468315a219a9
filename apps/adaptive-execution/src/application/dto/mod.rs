//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for use case inputs and outputs.

mod execution_dto;

pub use execution_dto::{BatchExecutionReport, ExecutionRequest, IdempotentExecution};
