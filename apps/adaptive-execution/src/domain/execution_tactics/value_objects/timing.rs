//! Market-timing advisor configuration and output.

use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// When the post-open window is and how long to wait inside it.
///
/// Times are exchange-local (US/Eastern).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketTimingConfig {
    /// Regular session open.
    #[serde(default = "default_open_time")]
    pub open_time: NaiveTime,
    /// Length of the post-open window, in minutes.
    #[serde(default = "default_window_minutes")]
    pub open_window_minutes: u32,
    /// Wait for a normal spread inside the window, in seconds.
    #[serde(default = "default_normal_wait_secs")]
    pub normal_spread_wait_secs: u64,
    /// Wait for a wide spread inside the window, in seconds.
    #[serde(default = "default_wide_wait_secs")]
    pub wide_spread_wait_secs: u64,
    /// Slippage tolerance for urgent spreads.
    #[serde(default = "default_urgent_slippage_bps")]
    pub urgent_slippage_bps: u32,
    /// Slippage tolerance for tight spreads.
    #[serde(default = "default_tight_slippage_bps")]
    pub tight_slippage_bps: u32,
    /// Slippage tolerance for normal spreads.
    #[serde(default = "default_normal_slippage_bps")]
    pub normal_slippage_bps: u32,
    /// Slippage tolerance for wide spreads.
    #[serde(default = "default_wide_slippage_bps")]
    pub wide_slippage_bps: u32,
}

fn default_open_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN)
}

const fn default_window_minutes() -> u32 {
    5
}

const fn default_normal_wait_secs() -> u64 {
    30
}

const fn default_wide_wait_secs() -> u64 {
    90
}

const fn default_urgent_slippage_bps() -> u32 {
    5
}

const fn default_tight_slippage_bps() -> u32 {
    10
}

const fn default_normal_slippage_bps() -> u32 {
    25
}

const fn default_wide_slippage_bps() -> u32 {
    50
}

impl Default for MarketTimingConfig {
    fn default() -> Self {
        Self {
            open_time: default_open_time(),
            open_window_minutes: default_window_minutes(),
            normal_spread_wait_secs: default_normal_wait_secs(),
            wide_spread_wait_secs: default_wide_wait_secs(),
            urgent_slippage_bps: default_urgent_slippage_bps(),
            tight_slippage_bps: default_tight_slippage_bps(),
            normal_slippage_bps: default_normal_slippage_bps(),
            wide_slippage_bps: default_wide_slippage_bps(),
        }
    }
}

/// Output of the market-timing advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingAdvice {
    /// How long to wait before the first submission.
    pub wait: Duration,
    /// Maximum acceptable slippage in basis points.
    pub max_slippage_bps: u32,
    /// Whether the time fell inside the post-open window.
    pub in_open_window: bool,
}

impl TimingAdvice {
    /// Returns true if the advisor recommends executing now.
    #[must_use]
    pub const fn execute_now(&self) -> bool {
        self.wait.is_zero()
    }
}
