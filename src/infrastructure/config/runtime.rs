//! Scheduler, watchdog and status-file settings.

use std::time::Duration;

use serde::Deserialize;

/// Boundary scheduler polling.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// How often the clock is checked for boundary crossings (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl SchedulerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// In-process catch-up of uncommitted boundaries.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_watchdog_interval_secs")]
    pub interval_secs: u64,
    /// Minimum age of a boundary before it is considered lagging.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
}

fn default_watchdog_interval_secs() -> u64 {
    60
}

fn default_grace_secs() -> u64 {
    120
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_watchdog_interval_secs(),
            grace_secs: default_grace_secs(),
        }
    }
}
