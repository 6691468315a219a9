//! Final outcome of one execution sequence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderSide, OrderStatus};
use crate::domain::order_execution::errors::{ErrorKind, ExecutionError};
use crate::domain::shared::{OrderId, Symbol};

/// Result of executing one trade intent.
///
/// Built once when the sequence finishes and never mutated afterwards.
/// `order_id` and `terminal_status` describe the last order the sequence
/// submitted; fills are cumulative across every attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the full requested quantity was filled.
    pub success: bool,
    /// Instrument traded.
    pub symbol: Symbol,
    /// Trade direction.
    pub side: OrderSide,
    /// Share quantity the sequence set out to fill.
    pub requested_quantity: Decimal,
    /// Last broker order id, if any order was accepted.
    pub order_id: Option<OrderId>,
    /// Terminal status of the last order, if known.
    pub terminal_status: Option<OrderStatus>,
    /// Cumulative filled quantity across all attempts.
    pub filled_quantity: Decimal,
    /// Quantity-weighted average fill price across all attempts.
    pub avg_fill_price: Option<Decimal>,
    /// Number of orders submitted, market fallback included.
    pub attempts: u32,
    /// Whether the sequence ended with a market order.
    pub used_market_fallback: bool,
    /// When the sequence started.
    pub submitted_at: DateTime<Utc>,
    /// When the sequence reached a terminal order state.
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure description.
    pub error: Option<String>,
    /// Failure category.
    pub error_kind: Option<ErrorKind>,
}

impl ExecutionResult {
    /// Result for a request that failed before any order was submitted.
    #[must_use]
    pub fn rejected(
        symbol: Symbol,
        side: OrderSide,
        requested_quantity: Decimal,
        submitted_at: DateTime<Utc>,
        error: &ExecutionError,
    ) -> Self {
        Self {
            success: false,
            symbol,
            side,
            requested_quantity,
            order_id: None,
            terminal_status: None,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
            attempts: 0,
            used_market_fallback: false,
            submitted_at,
            completed_at: None,
            error: Some(error.message.clone()),
            error_kind: Some(error.kind),
        }
    }

    /// Returns true if something filled but the sequence did not complete.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.success && self.filled_quantity > Decimal::ZERO
    }
}
