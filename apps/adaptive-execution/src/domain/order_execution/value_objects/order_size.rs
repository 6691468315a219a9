//! Order sizing: share count or dollar notional.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much of an instrument an order asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "snake_case")]
pub enum OrderSize {
    /// A share quantity (fractional when the asset allows it).
    Shares(Decimal),
    /// A dollar amount; the broker derives the share quantity.
    Notional(Decimal),
}

impl OrderSize {
    /// The raw amount, shares or dollars.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        match self {
            Self::Shares(amount) | Self::Notional(amount) => *amount,
        }
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount() > Decimal::ZERO
    }

    /// Returns true for notional sizing.
    #[must_use]
    pub const fn is_notional(&self) -> bool {
        matches!(self, Self::Notional(_))
    }
}

impl fmt::Display for OrderSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shares(qty) => write!(f, "{qty} shares"),
            Self::Notional(amount) => write!(f, "${amount}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_and_positivity() {
        assert_eq!(OrderSize::Shares(dec!(10)).amount(), dec!(10));
        assert!(OrderSize::Notional(dec!(250.50)).is_positive());
        assert!(!OrderSize::Shares(Decimal::ZERO).is_positive());
        assert!(!OrderSize::Shares(dec!(-1)).is_positive());
    }

    #[test]
    fn display() {
        assert_eq!(OrderSize::Shares(dec!(3.5)).to_string(), "3.5 shares");
        assert_eq!(OrderSize::Notional(dec!(100)).to_string(), "$100");
    }
}
