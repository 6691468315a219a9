//! Completion monitor configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The `monitor` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Polling cadence when no order update stream is available, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Safety-net polling cadence while streaming, in milliseconds.
    #[serde(default = "default_backstop_interval_ms")]
    pub backstop_interval_ms: u64,
}

impl MonitorConfig {
    /// Polling cadence.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Backstop cadence.
    #[must_use]
    pub const fn backstop_interval(&self) -> Duration {
        Duration::from_millis(self.backstop_interval_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            backstop_interval_ms: default_backstop_interval_ms(),
        }
    }
}

const fn default_poll_interval_ms() -> u64 {
    500
}

const fn default_backstop_interval_ms() -> u64 {
    5_000
}
