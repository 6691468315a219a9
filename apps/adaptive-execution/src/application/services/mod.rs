//! Application Services
//!
//! Services shared by the use cases: waiting on order completion, guarding
//! against replayed executions and sizing trade intents.

pub mod completion_monitor;
mod idempotency_store;
mod share_resolver;

pub use completion_monitor::{
    CompletionMap, CompletionMonitor, CompletionOutcome, CompletionStatus,
    PollingCompletionMonitor, StreamingCompletionMonitor,
};
pub use idempotency_store::{
    EXECUTION_ATTEMPTS_KEY, ExecutionAttemptRecord, ExecutionClaim, ExecutionIdempotencyStore,
    IdempotencyError,
};
pub use share_resolver::ShareQuantityResolver;
