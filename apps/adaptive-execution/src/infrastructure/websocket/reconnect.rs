//! Reconnect backoff for the trade update stream.

use std::time::Duration;

use rand::Rng;

use super::types::TradeStreamConfig;

/// Exponential backoff with full jitter.
///
/// Attempt `n` sleeps a uniformly random duration in
/// `[0, min(max_backoff, initial_backoff * multiplier^n))`.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    max_attempts: u32,
    attempts: u32,
}

impl ReconnectPolicy {
    /// Build a policy.
    #[must_use]
    pub const fn new(
        initial_backoff: Duration,
        max_backoff: Duration,
        multiplier: f64,
        max_attempts: u32,
    ) -> Self {
        Self {
            initial_backoff,
            max_backoff,
            multiplier,
            max_attempts,
            attempts: 0,
        }
    }

    /// Policy carrying the stream configuration's backoff settings.
    #[must_use]
    pub const fn from_config(config: &TradeStreamConfig) -> Self {
        Self::new(
            config.initial_backoff,
            config.max_backoff,
            config.backoff_multiplier,
            config.max_reconnect_attempts,
        )
    }

    /// Delay before the next reconnect, or `None` once attempts are spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let exponent = i32::try_from(self.attempts).unwrap_or(i32::MAX);
        let ceiling = (self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent))
            .min(self.max_backoff.as_secs_f64());
        self.attempts += 1;

        if !ceiling.is_finite() || ceiling <= 0.0 {
            return Some(Duration::ZERO);
        }
        Some(Duration::from_secs_f64(rand::rng().random_range(0.0..ceiling)))
    }

    /// Forget past failures after a successful handshake.
    pub const fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Reconnects attempted since the last reset.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the retry budget is spent.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(60), 2.0, 10)
    }
}
