//! Order Aggregate Root
//!
//! A local snapshot of a broker order. The broker owns the order's
//! lifecycle; this type only records the latest reported status and fills,
//! refusing updates once a terminal status has been seen.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::value_objects::{
    OrderSide, OrderStatus, OrderType, TimeInForce,
};
use crate::domain::shared::{ClientOrderId, DomainError, OrderId, Symbol};

/// Latest known state of a broker order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Broker-assigned identifier.
    pub id: OrderId,
    /// Identifier we sent with the submission.
    pub client_order_id: Option<ClientOrderId>,
    /// Instrument.
    pub symbol: Symbol,
    /// Direction.
    pub side: OrderSide,
    /// Share quantity; zero for a notional order the broker has not sized yet.
    pub quantity: Decimal,
    /// Dollar amount for notional orders.
    pub notional: Option<Decimal>,
    /// Market or limit.
    pub order_type: OrderType,
    /// Present iff `order_type` is `Limit`.
    pub limit_price: Option<Decimal>,
    /// Validity window.
    pub time_in_force: TimeInForce,
    /// Latest reported status.
    pub status: OrderStatus,
    /// Cumulative filled quantity.
    pub filled_quantity: Decimal,
    /// Average price of the filled quantity.
    pub avg_fill_price: Option<Decimal>,
    /// Broker creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the latest update.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns true once the broker has reported a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Quantity still open. Zero for unsized notional orders.
    #[must_use]
    pub fn remaining_quantity(&self) -> Decimal {
        (self.quantity - self.filled_quantity).max(Decimal::ZERO)
    }

    /// Record a broker-reported status.
    ///
    /// Returns `Ok(false)` without changing anything when the order is
    /// already terminal. A fill that completes the order forces `Filled`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Overfill`] if the reported fill
    /// exceeds the order quantity.
    pub fn apply_update(
        &mut self,
        status: OrderStatus,
        filled_quantity: Decimal,
        avg_fill_price: Option<Decimal>,
        at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        if self.is_terminal() {
            return Ok(false);
        }

        if self.quantity > Decimal::ZERO && filled_quantity > self.quantity {
            return Err(DomainError::Overfill {
                filled: filled_quantity,
                quantity: self.quantity,
            });
        }

        self.filled_quantity = filled_quantity;
        if avg_fill_price.is_some() {
            self.avg_fill_price = avg_fill_price;
        }
        self.status = if self.quantity > Decimal::ZERO && filled_quantity == self.quantity {
            OrderStatus::Filled
        } else {
            status
        };
        self.updated_at = at;
        Ok(true)
    }

    /// Check the snapshot's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity <= Decimal::ZERO && self.notional.is_none() {
            return Err(DomainError::invalid_value(
                "quantity",
                "must be positive unless the order is notional",
            ));
        }
        if self.order_type.requires_limit_price() != self.limit_price.is_some() {
            return Err(DomainError::invalid_value(
                "limit_price",
                "must be present exactly for limit orders",
            ));
        }
        if self.filled_quantity < Decimal::ZERO {
            return Err(DomainError::invalid_value(
                "filled_quantity",
                "must not be negative",
            ));
        }
        if self.quantity > Decimal::ZERO && self.filled_quantity > self.quantity {
            return Err(DomainError::Overfill {
                filled: self.filled_quantity,
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limit_order(qty: Decimal) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new("ord-1"),
            client_order_id: Some(ClientOrderId::new("cli-1")),
            symbol: Symbol::new("AAPL"),
            side: OrderSide::Buy,
            quantity: qty,
            notional: None,
            order_type: OrderType::Limit,
            limit_price: Some(dec!(150.01)),
            time_in_force: TimeInForce::Day,
            status: OrderStatus::Accepted,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_fill_forces_filled_status() {
        let mut order = limit_order(dec!(10));
        let applied = order
            .apply_update(OrderStatus::PartiallyFilled, dec!(10), Some(dec!(150)), Utc::now())
            .unwrap();
        assert!(applied);
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.remaining_quantity(), Decimal::ZERO);
    }

    #[test]
    fn terminal_order_is_frozen() {
        let mut order = limit_order(dec!(10));
        order
            .apply_update(OrderStatus::Canceled, dec!(4), Some(dec!(150)), Utc::now())
            .unwrap();

        let applied = order
            .apply_update(OrderStatus::Filled, dec!(10), Some(dec!(151)), Utc::now())
            .unwrap();
        assert!(!applied);
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.filled_quantity, dec!(4));
        assert_eq!(order.remaining_quantity(), dec!(6));
    }

    #[test]
    fn overfill_is_rejected() {
        let mut order = limit_order(dec!(10));
        let err = order
            .apply_update(OrderStatus::Filled, dec!(11), None, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::Overfill {
                filled: dec!(11),
                quantity: dec!(10)
            }
        );
    }

    #[test]
    fn validate_limit_price_presence() {
        let mut order = limit_order(dec!(10));
        assert!(order.validate().is_ok());

        order.limit_price = None;
        assert!(order.validate().is_err());
    }

    #[test]
    fn notional_order_may_have_zero_quantity() {
        let mut order = limit_order(Decimal::ZERO);
        order.order_type = OrderType::Market;
        order.limit_price = None;
        order.notional = Some(dec!(500));
        assert!(order.validate().is_ok());
    }
}
