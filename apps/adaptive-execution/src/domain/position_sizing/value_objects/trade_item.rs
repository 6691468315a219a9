//! Trade intent produced by upstream rebalance planning.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::OrderSide;
use crate::domain::shared::Symbol;

/// One line of a rebalance plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeItem {
    /// Instrument.
    pub symbol: Symbol,
    /// Direction.
    pub action: OrderSide,
    /// Dollar amount to trade; the sign is ignored.
    pub trade_amount: Decimal,
    /// Portfolio weight after the trade; zero on a sell means exit the position.
    pub target_weight: Decimal,
}

impl TradeItem {
    /// Create a trade item.
    #[must_use]
    pub const fn new(
        symbol: Symbol,
        action: OrderSide,
        trade_amount: Decimal,
        target_weight: Decimal,
    ) -> Self {
        Self {
            symbol,
            action,
            trade_amount,
            target_weight,
        }
    }

    /// A sell down to zero weight: the whole position goes.
    #[must_use]
    pub fn is_full_liquidation(&self) -> bool {
        self.action == OrderSide::Sell && self.target_weight.is_zero()
    }
}
