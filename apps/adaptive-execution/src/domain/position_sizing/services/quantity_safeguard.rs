//! Quantity Safeguard Domain Service
//!
//! Derives a share quantity from a dollar trade amount without ever
//! selling more than is held. A full liquidation returns the held position
//! exactly, fractional remainder included, whatever the asset's
//! fractionability.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::OrderSide;
use crate::domain::position_sizing::value_objects::{AssetInfo, TradeItem};

/// Configuration for the quantity safeguard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeguardConfig {
    /// Prices below this are treated as missing.
    #[serde(default = "default_min_valid_price")]
    pub min_valid_price: Decimal,
    /// Quantity bought when no usable price exists.
    #[serde(default = "default_minimum_unit")]
    pub minimum_unit: Decimal,
    /// Decimal places kept on computed fractional quantities (rounded down).
    #[serde(default = "default_quantity_precision")]
    pub quantity_precision: u32,
}

fn default_min_valid_price() -> Decimal {
    Decimal::new(1, 2) // $0.01
}

const fn default_minimum_unit() -> Decimal {
    Decimal::ONE
}

const fn default_quantity_precision() -> u32 {
    6
}

impl Default for SafeguardConfig {
    fn default() -> Self {
        Self {
            min_valid_price: default_min_valid_price(),
            minimum_unit: default_minimum_unit(),
            quantity_precision: default_quantity_precision(),
        }
    }
}

/// How a quantity was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingBasis {
    /// Whole position, no price needed.
    Liquidation,
    /// Trade amount divided by a usable price.
    Priced,
    /// No usable price on a buy; minimum unit bought.
    MinimumUnit,
    /// No usable price on a sell; whole position sold.
    FullPosition,
}

/// Result of a quantity resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareResolution {
    /// Share quantity to trade; never negative.
    pub quantity: Decimal,
    /// How the quantity was derived.
    pub basis: SizingBasis,
    /// Price used, when one was usable.
    pub price: Option<Decimal>,
    /// Whether a sell was capped at the held position.
    pub capped_at_position: bool,
}

/// Converts trade intents into safe share quantities.
#[derive(Debug, Clone, Default)]
pub struct QuantitySafeguard {
    config: SafeguardConfig,
}

impl QuantitySafeguard {
    /// Create a safeguard with custom configuration.
    #[must_use]
    pub const fn with_config(config: SafeguardConfig) -> Self {
        Self { config }
    }

    /// Whether a price is usable for sizing.
    #[must_use]
    pub fn is_usable_price(&self, price: Decimal) -> bool {
        price >= self.config.min_valid_price
    }

    /// Resolve the share quantity for `item`.
    ///
    /// `price` is ignored on the liquidation path. `position` is the held
    /// quantity (zero when flat); negative positions are treated as flat.
    #[must_use]
    pub fn resolve(
        &self,
        item: &TradeItem,
        price: Option<Decimal>,
        position: Decimal,
        asset: &AssetInfo,
    ) -> ShareResolution {
        let position = position.max(Decimal::ZERO);

        if item.is_full_liquidation() {
            return ShareResolution {
                quantity: position,
                basis: SizingBasis::Liquidation,
                price: None,
                capped_at_position: false,
            };
        }

        let price = price.filter(|p| self.is_usable_price(*p));
        let Some(price) = price else {
            return match item.action {
                OrderSide::Buy => ShareResolution {
                    quantity: self.round_for_asset(self.config.minimum_unit, item.action, asset),
                    basis: SizingBasis::MinimumUnit,
                    price: None,
                    capped_at_position: false,
                },
                OrderSide::Sell => ShareResolution {
                    quantity: position,
                    basis: SizingBasis::FullPosition,
                    price: None,
                    capped_at_position: false,
                },
            };
        };

        let raw = (item.trade_amount.abs() / price).round_dp_with_strategy(
            self.config.quantity_precision,
            RoundingStrategy::ToZero,
        );

        let (quantity, capped_at_position) = match item.action {
            OrderSide::Sell if raw > position => (position, true),
            _ => (raw, false),
        };

        ShareResolution {
            quantity: self.round_for_asset(quantity, item.action, asset),
            basis: SizingBasis::Priced,
            price: Some(price),
            capped_at_position,
        }
    }

    /// Non-fractionable buys are rounded down to whole shares.
    fn round_for_asset(&self, quantity: Decimal, side: OrderSide, asset: &AssetInfo) -> Decimal {
        if side == OrderSide::Buy && !asset.fractionable {
            quantity.floor()
        } else {
            quantity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Symbol;
    use rust_decimal_macros::dec;

    fn item(action: OrderSide, amount: Decimal, weight: Decimal) -> TradeItem {
        TradeItem::new(Symbol::new("XYZ"), action, amount, weight)
    }

    fn fractional() -> AssetInfo {
        AssetInfo::new(Symbol::new("XYZ"), true)
    }

    fn whole_shares() -> AssetInfo {
        AssetInfo::new(Symbol::new("XYZ"), false)
    }

    #[test]
    fn sell_is_capped_at_position() {
        let safeguard = QuantitySafeguard::default();
        let resolution = safeguard.resolve(
            &item(OrderSide::Sell, dec!(-71365.37), dec!(0.02)),
            Some(dec!(1.00)),
            dec!(907.32),
            &fractional(),
        );
        assert_eq!(resolution.quantity, dec!(907.32));
        assert!(resolution.capped_at_position);
        assert_eq!(resolution.basis, SizingBasis::Priced);
    }

    #[test]
    fn liquidation_returns_exact_position_even_when_not_fractionable() {
        let safeguard = QuantitySafeguard::default();
        let resolution = safeguard.resolve(
            &item(OrderSide::Sell, dec!(-10), dec!(0)),
            Some(dec!(33.33)),
            dec!(0.3),
            &whole_shares(),
        );
        assert_eq!(resolution.quantity, dec!(0.3));
        assert_eq!(resolution.basis, SizingBasis::Liquidation);
    }

    #[test]
    fn fractional_buy_on_whole_share_asset_rounds_to_zero() {
        let safeguard = QuantitySafeguard::default();
        let resolution = safeguard.resolve(
            &item(OrderSide::Buy, dec!(3.00), dec!(0.01)),
            Some(dec!(10.00)),
            Decimal::ZERO,
            &whole_shares(),
        );
        assert_eq!(resolution.quantity, Decimal::ZERO);
    }

    #[test]
    fn fractional_buy_keeps_precision() {
        let safeguard = QuantitySafeguard::default();
        let resolution = safeguard.resolve(
            &item(OrderSide::Buy, dec!(100), dec!(0.01)),
            Some(dec!(3)),
            Decimal::ZERO,
            &fractional(),
        );
        assert_eq!(resolution.quantity, dec!(33.333333));
    }

    #[test]
    fn buy_is_not_capped() {
        let safeguard = QuantitySafeguard::default();
        let resolution = safeguard.resolve(
            &item(OrderSide::Buy, dec!(1000), dec!(0.10)),
            Some(dec!(10)),
            dec!(5),
            &whole_shares(),
        );
        assert_eq!(resolution.quantity, dec!(100));
        assert!(!resolution.capped_at_position);
    }

    #[test]
    fn missing_price_buys_minimum_unit() {
        let safeguard = QuantitySafeguard::default();
        let resolution = safeguard.resolve(
            &item(OrderSide::Buy, dec!(5000), dec!(0.05)),
            None,
            Decimal::ZERO,
            &whole_shares(),
        );
        assert_eq!(resolution.quantity, dec!(1));
        assert_eq!(resolution.basis, SizingBasis::MinimumUnit);
    }

    #[test]
    fn implausible_price_is_treated_as_missing() {
        let safeguard = QuantitySafeguard::default();
        let buy = safeguard.resolve(
            &item(OrderSide::Buy, dec!(5000), dec!(0.05)),
            Some(dec!(0.001)),
            Decimal::ZERO,
            &fractional(),
        );
        assert_eq!(buy.quantity, dec!(1));

        let sell = safeguard.resolve(
            &item(OrderSide::Sell, dec!(-5000), dec!(0.01)),
            Some(dec!(0.001)),
            dec!(42.5),
            &fractional(),
        );
        assert_eq!(sell.quantity, dec!(42.5));
        assert_eq!(sell.basis, SizingBasis::FullPosition);
    }

    #[test]
    fn negative_position_is_flat() {
        let safeguard = QuantitySafeguard::default();
        let resolution = safeguard.resolve(
            &item(OrderSide::Sell, dec!(-10), dec!(0)),
            None,
            dec!(-3),
            &fractional(),
        );
        assert_eq!(resolution.quantity, Decimal::ZERO);
    }
}
