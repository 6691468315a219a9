//! Repricing Strategy Configuration

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::execution_tactics::errors::TacticError;

/// Tick size inputs for the tick resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSizeConfig {
    /// Tick for instruments priced at or above `sub_dollar_threshold`.
    #[serde(default = "default_tick")]
    pub default_tick: Decimal,
    /// Tick for instruments priced below `sub_dollar_threshold`.
    #[serde(default = "default_sub_dollar_tick")]
    pub sub_dollar_tick: Decimal,
    /// Price below which `sub_dollar_tick` applies.
    #[serde(default = "default_sub_dollar_threshold")]
    pub sub_dollar_threshold: Decimal,
    /// Per-symbol ticks that win over the price bands.
    #[serde(default)]
    pub overrides: HashMap<String, Decimal>,
}

fn default_tick() -> Decimal {
    Decimal::new(1, 2) // $0.01
}

fn default_sub_dollar_tick() -> Decimal {
    Decimal::new(1, 4) // $0.0001
}

fn default_sub_dollar_threshold() -> Decimal {
    Decimal::ONE
}

impl Default for TickSizeConfig {
    fn default() -> Self {
        Self {
            default_tick: default_tick(),
            sub_dollar_tick: default_sub_dollar_tick(),
            sub_dollar_threshold: default_sub_dollar_threshold(),
            overrides: HashMap::new(),
        }
    }
}

/// Longest wait any single strategy duration may configure.
pub const MAX_STRATEGY_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Parameters for one repeg sequence.
///
/// Immutable after construction; share it as `Arc<StrategyConfig>`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    /// Number of limit attempts before giving up on limits.
    pub max_attempts: u32,
    /// Wait for attempt 0.
    pub base_timeout: Duration,
    /// Growth factor applied to the wait on every attempt.
    pub timeout_multiplier: f64,
    /// Extra ticks of aggressiveness added per attempt.
    pub price_improvement_ticks_per_attempt: u32,
    /// Minimum spacing between two submissions.
    pub min_repeg_interval: Duration,
    /// Spread widening, in basis points of the original spread, that pauses the sequence.
    pub volatility_pause_threshold_bps: u32,
    /// Chase price across attempts. When off every attempt uses attempt 0's offset.
    pub enable_adaptive_pricing: bool,
    /// Check spread degradation at every repeg boundary.
    pub enable_volatility_pause: bool,
    /// Finish with a market order when the limit sequence cannot.
    pub enable_market_fallback: bool,
    /// Honor the market-timing advisor's recommended wait.
    pub enable_timing_wait: bool,
    /// Upper bound on the whole limit sequence.
    pub max_total_wait: Duration,
    /// How long to wait for a cancel to be confirmed.
    pub cancel_confirm_timeout: Duration,
    /// How long to wait for a market fallback order to fill.
    pub market_fallback_timeout: Duration,
    /// How long a batch waits for sells to settle before buying.
    pub settlement_timeout: Duration,
    /// Tick resolution inputs.
    pub tick_sizes: TickSizeConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_timeout: Duration::from_secs(10),
            timeout_multiplier: 1.5,
            price_improvement_ticks_per_attempt: 1,
            min_repeg_interval: Duration::from_secs(1),
            volatility_pause_threshold_bps: 10_000,
            enable_adaptive_pricing: true,
            enable_volatility_pause: true,
            enable_market_fallback: true,
            enable_timing_wait: true,
            max_total_wait: Duration::from_secs(120),
            cancel_confirm_timeout: Duration::from_secs(5),
            market_fallback_timeout: Duration::from_secs(30),
            settlement_timeout: Duration::from_secs(60),
            tick_sizes: TickSizeConfig::default(),
        }
    }
}

impl StrategyConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TacticError`] naming the first parameter out of range.
    pub fn validate(&self) -> Result<(), TacticError> {
        if self.max_attempts == 0 {
            return Err(TacticError::invalid("max_attempts", "must be at least 1"));
        }
        if !self.timeout_multiplier.is_finite() || self.timeout_multiplier < 1.0 {
            return Err(TacticError::invalid(
                "timeout_multiplier",
                format!("must be >= 1.0, got {}", self.timeout_multiplier),
            ));
        }
        if self.base_timeout.is_zero() {
            return Err(TacticError::invalid("base_timeout", "must be positive"));
        }
        if self.max_total_wait.is_zero() {
            return Err(TacticError::invalid("max_total_wait", "must be positive"));
        }
        for (parameter, wait) in [
            ("base_timeout", self.base_timeout),
            ("min_repeg_interval", self.min_repeg_interval),
            ("max_total_wait", self.max_total_wait),
            ("cancel_confirm_timeout", self.cancel_confirm_timeout),
            ("market_fallback_timeout", self.market_fallback_timeout),
            ("settlement_timeout", self.settlement_timeout),
        ] {
            if wait > MAX_STRATEGY_WAIT {
                return Err(TacticError::invalid(
                    parameter,
                    format!("must not exceed {}s", MAX_STRATEGY_WAIT.as_secs()),
                ));
            }
        }
        let ticks = &self.tick_sizes;
        if ticks.default_tick <= Decimal::ZERO || ticks.sub_dollar_tick <= Decimal::ZERO {
            return Err(TacticError::invalid("tick_sizes", "must be positive"));
        }
        if let Some((symbol, _)) = ticks.overrides.iter().find(|(_, t)| **t <= Decimal::ZERO) {
            return Err(TacticError::invalid(
                "tick_sizes.overrides",
                format!("entry for {symbol} must be positive"),
            ));
        }
        Ok(())
    }
}
