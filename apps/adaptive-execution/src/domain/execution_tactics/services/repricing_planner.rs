//! Repricing Planner Domain Service
//!
//! Pure functions of an [`AttemptState`] and a [`StrategyConfig`]: the
//! limit price and wait for attempt N, and whether the spread has degraded
//! enough to stop chasing.

use std::time::Duration;

use rust_decimal::Decimal;

use crate::domain::execution_tactics::services::TickResolver;
use crate::domain::execution_tactics::value_objects::{AttemptPlan, AttemptState, StrategyConfig};
use crate::domain::order_execution::OrderSide;

/// Stateless repricing planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepricingPlanner;

impl RepricingPlanner {
    /// The full attempt schedule for `config`.
    #[must_use]
    pub fn plan_attempts(config: &StrategyConfig) -> Vec<AttemptPlan> {
        (0..config.max_attempts)
            .map(|attempt| AttemptPlan {
                attempt,
                timeout: Self::timeout(attempt, config),
                price_improvement_ticks: attempt
                    .saturating_mul(config.price_improvement_ticks_per_attempt),
            })
            .collect()
    }

    /// Wait for `attempt`: `base_timeout * multiplier^attempt`.
    #[must_use]
    pub fn timeout(attempt: u32, config: &StrategyConfig) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = config.timeout_multiplier.powi(exponent);
        Duration::try_from_secs_f64(config.base_timeout.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }

    /// Marketable limit price for `attempt`.
    ///
    /// Starts one tick through the far side of the quote (ask + tick for a
    /// buy, bid - tick for a sell) and, with adaptive pricing on, moves a
    /// further `price_improvement_ticks_per_attempt` ticks per attempt. The
    /// result sits on the tick grid, and a sell never goes below one tick.
    #[must_use]
    pub fn price_for_attempt(state: &AttemptState, attempt: u32, config: &StrategyConfig) -> Decimal {
        let tick = TickResolver::new(&config.tick_sizes).resolve(state.symbol(), state.midpoint());

        let improvement = if config.enable_adaptive_pricing {
            tick * Decimal::from(config.price_improvement_ticks_per_attempt)
                * Decimal::from(attempt)
        } else {
            Decimal::ZERO
        };

        let raw = match state.side() {
            OrderSide::Buy => state.ask() + tick + improvement,
            OrderSide::Sell => state.bid() - tick - improvement,
        };
        let price = TickResolver::quantize(raw, tick);

        match state.side() {
            OrderSide::Buy => price,
            OrderSide::Sell => price.max(tick),
        }
    }

    /// Whether the spread has widened past the volatility threshold.
    ///
    /// Degradation is measured in basis points of the original spread.
    #[must_use]
    pub fn should_pause_for_volatility(
        original_spread: Decimal,
        current_spread: Decimal,
        config: &StrategyConfig,
    ) -> bool {
        if !config.enable_volatility_pause || original_spread <= Decimal::ZERO {
            return false;
        }
        let degradation_bps =
            (current_spread - original_spread) / original_spread * Decimal::from(10_000);
        degradation_bps > Decimal::from(config.volatility_pause_threshold_bps)
    }
}
