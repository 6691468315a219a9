//! Repricing sequence configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::execution_tactics::{StrategyConfig, TickSizeConfig};

/// The `execution` section. Converted into an immutable [`StrategyConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Limit attempts before giving up on limits.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait for the first attempt, in seconds.
    #[serde(default = "default_base_timeout_secs")]
    pub base_timeout_secs: f64,
    /// Growth factor of the per-attempt wait.
    #[serde(default = "default_timeout_multiplier")]
    pub timeout_multiplier: f64,
    /// Extra ticks of aggressiveness per attempt.
    #[serde(default = "default_improvement_ticks")]
    pub price_improvement_ticks_per_attempt: u32,
    /// Minimum spacing between submissions, in milliseconds.
    #[serde(default = "default_min_repeg_interval_ms")]
    pub min_repeg_interval_ms: u64,
    /// Spread widening (bps of the original spread) that pauses the sequence.
    #[serde(default = "default_volatility_pause_bps")]
    pub volatility_pause_threshold_bps: u32,
    /// Chase price across attempts.
    #[serde(default = "default_true")]
    pub enable_adaptive_pricing: bool,
    /// Pause when the spread blows out.
    #[serde(default = "default_true")]
    pub enable_volatility_pause: bool,
    /// Finish with a market order when limits cannot.
    #[serde(default = "default_true")]
    pub enable_market_fallback: bool,
    /// Honor the post-open timing wait.
    #[serde(default = "default_true")]
    pub enable_timing_wait: bool,
    /// Upper bound on the whole limit sequence, in seconds.
    #[serde(default = "default_max_total_wait_secs")]
    pub max_total_wait_secs: u64,
    /// Cancel confirmation wait, in seconds.
    #[serde(default = "default_cancel_confirm_secs")]
    pub cancel_confirm_timeout_secs: u64,
    /// Market fallback fill wait, in seconds.
    #[serde(default = "default_market_fallback_secs")]
    pub market_fallback_timeout_secs: u64,
    /// Batch wait for sells to settle before buys, in seconds.
    #[serde(default = "default_settlement_secs")]
    pub settlement_timeout_secs: u64,
    /// Tick sizes.
    #[serde(default)]
    pub tick_sizes: TickSizeConfig,
}

impl ExecutionConfig {
    /// Build the strategy configuration the orchestrator runs with.
    ///
    /// Negative or non-finite second counts become zero; `validate_config`
    /// rejects them before this is reached on the normal load path.
    #[must_use]
    pub fn to_strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            max_attempts: self.max_attempts,
            base_timeout: Duration::try_from_secs_f64(self.base_timeout_secs)
                .unwrap_or(Duration::ZERO),
            timeout_multiplier: self.timeout_multiplier,
            price_improvement_ticks_per_attempt: self.price_improvement_ticks_per_attempt,
            min_repeg_interval: Duration::from_millis(self.min_repeg_interval_ms),
            volatility_pause_threshold_bps: self.volatility_pause_threshold_bps,
            enable_adaptive_pricing: self.enable_adaptive_pricing,
            enable_volatility_pause: self.enable_volatility_pause,
            enable_market_fallback: self.enable_market_fallback,
            enable_timing_wait: self.enable_timing_wait,
            max_total_wait: Duration::from_secs(self.max_total_wait_secs),
            cancel_confirm_timeout: Duration::from_secs(self.cancel_confirm_timeout_secs),
            market_fallback_timeout: Duration::from_secs(self.market_fallback_timeout_secs),
            settlement_timeout: Duration::from_secs(self.settlement_timeout_secs),
            tick_sizes: self.tick_sizes.clone(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_timeout_secs: default_base_timeout_secs(),
            timeout_multiplier: default_timeout_multiplier(),
            price_improvement_ticks_per_attempt: default_improvement_ticks(),
            min_repeg_interval_ms: default_min_repeg_interval_ms(),
            volatility_pause_threshold_bps: default_volatility_pause_bps(),
            enable_adaptive_pricing: true,
            enable_volatility_pause: true,
            enable_market_fallback: true,
            enable_timing_wait: true,
            max_total_wait_secs: default_max_total_wait_secs(),
            cancel_confirm_timeout_secs: default_cancel_confirm_secs(),
            market_fallback_timeout_secs: default_market_fallback_secs(),
            settlement_timeout_secs: default_settlement_secs(),
            tick_sizes: TickSizeConfig::default(),
        }
    }
}

pub(super) const fn default_true() -> bool {
    true
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_timeout_secs() -> f64 {
    10.0
}

const fn default_timeout_multiplier() -> f64 {
    1.5
}

const fn default_improvement_ticks() -> u32 {
    1
}

const fn default_min_repeg_interval_ms() -> u64 {
    1_000
}

const fn default_volatility_pause_bps() -> u32 {
    10_000
}

const fn default_max_total_wait_secs() -> u64 {
    120
}

const fn default_cancel_confirm_secs() -> u64 {
    5
}

const fn default_market_fallback_secs() -> u64 {
    30
}

const fn default_settlement_secs() -> u64 {
    60
}
