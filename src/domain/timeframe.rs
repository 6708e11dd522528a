//! Timeframes and boundary arithmetic.
//!
//! A [`Timeframe`] is a named fixed-duration interval. A boundary is the
//! millisecond timestamp `floor(now / interval) * interval` and identifies one
//! unit of scheduled work for that timeframe.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Tracked interval identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "7d")]
    D7,
}

impl Timeframe {
    /// Every supported timeframe, shortest first.
    pub const ALL: [Timeframe; 5] = [
        Timeframe::M15,
        Timeframe::H1,
        Timeframe::H4,
        Timeframe::D1,
        Timeframe::D7,
    ];

    /// Interval length in milliseconds.
    #[must_use]
    pub const fn interval_ms(self) -> i64 {
        match self {
            Self::M15 => 15 * MINUTE_MS,
            Self::H1 => HOUR_MS,
            Self::H4 => 4 * HOUR_MS,
            Self::D1 => DAY_MS,
            Self::D7 => 7 * DAY_MS,
        }
    }

    /// Canonical label used in config, wire messages and state files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
            Self::D7 => "7d",
        }
    }

    /// Boundary containing `now_ms`.
    ///
    /// Uses floor division so instants before the epoch still round down.
    #[must_use]
    pub const fn boundary(self, now_ms: i64) -> i64 {
        let interval = self.interval_ms();
        now_ms.div_euclid(interval) * interval
    }

    /// Number of whole intervals between two boundaries (`to - from`).
    #[must_use]
    pub const fn intervals_between(self, from: i64, to: i64) -> i64 {
        (to - from).div_euclid(self.interval_ms())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| format!("unknown timeframe '{s}'"))
    }
}
