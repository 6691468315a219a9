//! Market-Timing Advisor Domain Service
//!
//! Spreads are unusually wide in the first minutes after the open. Inside a
//! short post-open window the advisor suggests waiting before working a
//! normal or wide spread; outside it, execution is immediate.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDateTime, TimeDelta, Utc, Weekday};
use chrono_tz::America::New_York;

use crate::domain::execution_tactics::value_objects::{
    MarketTimingConfig, SpreadClass, TimingAdvice,
};

/// Stateless timing advisor.
#[derive(Debug, Clone, Default)]
pub struct MarketTimingAdvisor {
    config: MarketTimingConfig,
}

impl MarketTimingAdvisor {
    /// Create an advisor.
    #[must_use]
    pub const fn new(config: MarketTimingConfig) -> Self {
        Self { config }
    }

    /// Advice for executing a spread of class `class` at `now`.
    ///
    /// Waits never extend past the end of the post-open window.
    #[must_use]
    pub fn advise(&self, now: DateTime<Utc>, class: SpreadClass) -> TimingAdvice {
        let max_slippage_bps = match class {
            SpreadClass::Urgent => self.config.urgent_slippage_bps,
            SpreadClass::Tight => self.config.tight_slippage_bps,
            SpreadClass::Normal => self.config.normal_slippage_bps,
            SpreadClass::Wide => self.config.wide_slippage_bps,
        };

        let local = exchange_local_time(now);
        let Some(until_window_end) = self.remaining_in_open_window(local) else {
            return TimingAdvice {
                wait: Duration::ZERO,
                max_slippage_bps,
                in_open_window: false,
            };
        };

        let wait = match class {
            SpreadClass::Urgent | SpreadClass::Tight => Duration::ZERO,
            SpreadClass::Normal => Duration::from_secs(self.config.normal_spread_wait_secs),
            SpreadClass::Wide => Duration::from_secs(self.config.wide_spread_wait_secs),
        };

        TimingAdvice {
            wait: wait.min(until_window_end),
            max_slippage_bps,
            in_open_window: true,
        }
    }

    /// Time left in the post-open window, or `None` outside it.
    fn remaining_in_open_window(&self, local: NaiveDateTime) -> Option<Duration> {
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return None;
        }
        let open = self.config.open_time;
        let (close, _) = open.overflowing_add_signed(TimeDelta::minutes(i64::from(
            self.config.open_window_minutes,
        )));
        let time = local.time();
        if time < open || time >= close {
            return None;
        }
        (close - time).to_std().ok()
    }
}

/// Convert a UTC instant to New York wall-clock time.
#[must_use]
pub fn exchange_local_time(now: DateTime<Utc>) -> NaiveDateTime {
    now.with_timezone(&New_York).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn dst_boundaries_2024() {
        let at = |h, m| exchange_local_time(utc(2024, 3, 10, h, m)).time();
        // Spring forward: 01:59 EST, then 03:00 EDT
        assert_eq!(at(6, 59), NaiveTime::from_hms_opt(1, 59, 0).unwrap());
        assert_eq!(at(7, 0), NaiveTime::from_hms_opt(3, 0, 0).unwrap());

        let at = |h, m| exchange_local_time(utc(2024, 11, 3, h, m)).time();
        // Fall back: 01:59 EDT, then 01:00 EST
        assert_eq!(at(5, 59), NaiveTime::from_hms_opt(1, 59, 0).unwrap());
        assert_eq!(at(6, 0), NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    }

    #[test]
    fn open_window_follows_daylight_time() {
        let advisor = MarketTimingAdvisor::default();
        // 09:31 EDT the day after the change, 08:31 under standard time
        assert!(advisor.advise(utc(2024, 3, 11, 13, 31), SpreadClass::Wide).in_open_window);
        // 09:31 EST the day after the change back
        assert!(advisor.advise(utc(2024, 11, 4, 14, 31), SpreadClass::Wide).in_open_window);
        assert!(!advisor.advise(utc(2024, 11, 4, 13, 31), SpreadClass::Wide).in_open_window);
    }

    #[test]
    fn converts_to_eastern() {
        // July: EDT, UTC-4
        let local = exchange_local_time(utc(2024, 7, 15, 13, 32));
        assert_eq!(local.time(), NaiveTime::from_hms_opt(9, 32, 0).unwrap());
        // January: EST, UTC-5
        let local = exchange_local_time(utc(2024, 1, 16, 14, 32));
        assert_eq!(local.time(), NaiveTime::from_hms_opt(9, 32, 0).unwrap());
    }

    #[test]
    fn waits_for_wide_spread_after_open() {
        let advisor = MarketTimingAdvisor::default();
        let advice = advisor.advise(utc(2024, 7, 15, 13, 30), SpreadClass::Wide);
        assert!(advice.in_open_window);
        assert_eq!(advice.wait, Duration::from_secs(90));
        assert_eq!(advice.max_slippage_bps, 50);
    }

    #[test]
    fn wait_is_capped_at_window_end() {
        let advisor = MarketTimingAdvisor::default();
        // 09:34 EDT, one minute of window left
        let advice = advisor.advise(utc(2024, 7, 15, 13, 34), SpreadClass::Wide);
        assert_eq!(advice.wait, Duration::from_secs(60));
    }

    #[test]
    fn tight_spreads_execute_immediately() {
        let advisor = MarketTimingAdvisor::default();
        let advice = advisor.advise(utc(2024, 7, 15, 13, 31), SpreadClass::Tight);
        assert!(advice.in_open_window);
        assert!(advice.execute_now());
        assert_eq!(advice.max_slippage_bps, 10);
    }

    #[test]
    fn no_wait_outside_window() {
        let advisor = MarketTimingAdvisor::default();
        // 08:32 EST, before the open
        assert!(advisor.advise(utc(2024, 1, 16, 13, 32), SpreadClass::Wide).execute_now());
        // 09:35 EDT, window just closed
        assert!(advisor.advise(utc(2024, 7, 15, 13, 35), SpreadClass::Wide).execute_now());
        // Saturday
        let advice = advisor.advise(utc(2024, 7, 13, 13, 31), SpreadClass::Normal);
        assert!(!advice.in_open_window);
        assert!(advice.execute_now());
    }
}
