//! Tick Resolver Domain Service
//!
//! Maps a symbol and price to the minimum price increment the broker
//! accepts, and snaps prices onto that grid.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::execution_tactics::value_objects::TickSizeConfig;
use crate::domain::shared::Symbol;

/// Resolves tick sizes from a [`TickSizeConfig`].
#[derive(Debug, Clone, Copy)]
pub struct TickResolver<'a> {
    config: &'a TickSizeConfig,
}

impl<'a> TickResolver<'a> {
    /// Create a resolver over the given tick configuration.
    #[must_use]
    pub const fn new(config: &'a TickSizeConfig) -> Self {
        Self { config }
    }

    /// Tick size for `symbol` trading around `price`.
    ///
    /// A per-symbol override wins; otherwise sub-dollar prices get the
    /// sub-dollar tick and everything else the default tick.
    #[must_use]
    pub fn resolve(&self, symbol: &Symbol, price: Decimal) -> Decimal {
        if let Some(tick) = self.config.overrides.get(symbol.as_str()) {
            return *tick;
        }
        if price < self.config.sub_dollar_threshold {
            self.config.sub_dollar_tick
        } else {
            self.config.default_tick
        }
    }

    /// Round `price` to the nearest multiple of `tick`, halves rounding up.
    #[must_use]
    pub fn quantize(price: Decimal, tick: Decimal) -> Decimal {
        if tick <= Decimal::ZERO {
            return price;
        }
        (price / tick).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn penny_tick_at_or_above_one_dollar() {
        let config = TickSizeConfig::default();
        let resolver = TickResolver::new(&config);
        assert_eq!(resolver.resolve(&Symbol::new("AAPL"), dec!(187.42)), dec!(0.01));
        assert_eq!(resolver.resolve(&Symbol::new("F"), dec!(1.00)), dec!(0.01));
    }

    #[test]
    fn sub_penny_tick_below_one_dollar() {
        let config = TickSizeConfig::default();
        let resolver = TickResolver::new(&config);
        assert_eq!(resolver.resolve(&Symbol::new("SNDL"), dec!(0.4512)), dec!(0.0001));
    }

    #[test]
    fn override_wins() {
        let mut config = TickSizeConfig::default();
        config.overrides.insert("BRK.A".to_string(), dec!(1));
        let resolver = TickResolver::new(&config);
        assert_eq!(resolver.resolve(&Symbol::new("brk.a"), dec!(620000)), dec!(1));
    }

    #[test]
    fn quantize_rounds_half_up() {
        assert_eq!(TickResolver::quantize(dec!(15.185), dec!(0.01)), dec!(15.19));
        assert_eq!(TickResolver::quantize(dec!(15.1849), dec!(0.01)), dec!(15.18));
        assert_eq!(TickResolver::quantize(dec!(0.45125), dec!(0.0001)), dec!(0.4513));
        assert_eq!(TickResolver::quantize(dec!(101.3), dec!(0.25)), dec!(101.25));
    }

    #[test]
    fn quantize_ignores_degenerate_tick() {
        assert_eq!(TickResolver::quantize(dec!(1.234), Decimal::ZERO), dec!(1.234));
    }
}
