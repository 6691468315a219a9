//! Execution DTOs

use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;

use crate::domain::order_execution::{ExecutionResult, OrderSide, OrderSize};
use crate::domain::shared::{CorrelationId, PlanHash, Symbol};

/// Request to execute one trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Symbol.
    pub symbol: Symbol,
    /// Side.
    pub side: OrderSide,
    /// Shares or dollar amount.
    pub size: OrderSize,
}

impl ExecutionRequest {
    /// Request sized in shares.
    #[must_use]
    pub const fn shares(symbol: Symbol, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol,
            side,
            size: OrderSize::Shares(quantity),
        }
    }

    /// Request sized in dollars.
    #[must_use]
    pub const fn notional(symbol: Symbol, side: OrderSide, amount: Decimal) -> Self {
        Self {
            symbol,
            side,
            size: OrderSize::Notional(amount),
        }
    }
}

/// Outcome of an idempotent execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotentExecution {
    /// The request ran.
    Executed(ExecutionResult),
    /// The pair was already recorded; nothing ran.
    Skipped {
        /// Correlation id of the replayed request.
        correlation_id: CorrelationId,
        /// Plan hash of the replayed request.
        plan_hash: PlanHash,
    },
}

impl IdempotentExecution {
    /// The execution result, if the request ran.
    #[must_use]
    pub const fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Executed(result) => Some(result),
            Self::Skipped { .. } => None,
        }
    }

    /// Returns true if the request was skipped as a replay.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Results of a sell-then-buy batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchExecutionReport {
    /// Results of the sell phase.
    pub sells: Vec<ExecutionResult>,
    /// Results of the buy phase.
    pub buys: Vec<ExecutionResult>,
    /// Whether every sell order settled before buys started.
    pub sells_settled: bool,
}

impl BatchExecutionReport {
    /// Returns true if every execution succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.sells.iter().chain(&self.buys).all(|r| r.success)
    }

    /// Number of failed executions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.sells.iter().chain(&self.buys).filter(|r| !r.success).count()
    }
}
