//! Clock Port
//!
//! Wall-clock time for market-timing decisions.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Source of wall-clock time.
pub trait ClockPort: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a settable instant.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock reading `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the clock.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }
}

impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_is_settable() {
        let t0 = Utc.with_ymd_and_hms(2024, 7, 15, 13, 30, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 7, 15, 15, 0, 0).unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now(), t0);
        clock.set(t1);
        assert_eq!(clock.now(), t1);
    }
}
