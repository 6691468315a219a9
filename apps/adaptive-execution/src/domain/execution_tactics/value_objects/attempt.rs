//! Per-sequence attempt state and the static attempt schedule.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::domain::order_execution::OrderSide;
use crate::domain::shared::Symbol;

/// Market state owned by one repeg sequence.
///
/// `original_spread` is captured from the first quote and never changes;
/// the volatility check compares every later quote against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptState {
    symbol: Symbol,
    side: OrderSide,
    bid: Decimal,
    ask: Decimal,
    original_spread: Decimal,
    last_attempt_time: Option<Instant>,
}

impl AttemptState {
    /// Start a sequence from its first quote.
    #[must_use]
    pub fn new(symbol: Symbol, side: OrderSide, bid: Decimal, ask: Decimal) -> Self {
        Self {
            symbol,
            side,
            bid,
            ask,
            original_spread: ask - bid,
            last_attempt_time: None,
        }
    }

    /// Replace the working quote. The original spread is kept.
    pub fn update_quote(&mut self, bid: Decimal, ask: Decimal) {
        self.bid = bid;
        self.ask = ask;
    }

    /// Record the time of a submission.
    pub fn mark_attempt(&mut self, at: Instant) {
        self.last_attempt_time = Some(at);
    }

    /// Instrument.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Direction.
    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    /// Working bid.
    #[must_use]
    pub const fn bid(&self) -> Decimal {
        self.bid
    }

    /// Working ask.
    #[must_use]
    pub const fn ask(&self) -> Decimal {
        self.ask
    }

    /// Spread of the first quote.
    #[must_use]
    pub const fn original_spread(&self) -> Decimal {
        self.original_spread
    }

    /// Spread of the working quote.
    #[must_use]
    pub fn current_spread(&self) -> Decimal {
        self.ask - self.bid
    }

    /// Midpoint of the working quote.
    #[must_use]
    pub fn midpoint(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// When the last order of this sequence was submitted.
    #[must_use]
    pub const fn last_attempt_time(&self) -> Option<Instant> {
        self.last_attempt_time
    }
}

/// One row of the attempt schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptPlan {
    /// Zero-based attempt index.
    pub attempt: u32,
    /// How long the attempt may rest before it is canceled.
    pub timeout: Duration,
    /// Ticks of extra aggressiveness beyond attempt 0.
    pub price_improvement_ticks: u32,
}
