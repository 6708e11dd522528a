//! Observability port for failed or unacknowledged runs.

use std::fmt;

use crate::domain::{RunSource, Timeframe};

/// Where in the run protocol a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Candles,
    Runner,
    Acknowledge,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Candles => "candles",
            Self::Runner => "runner",
            Self::Acknowledge => "acknowledge",
        })
    }
}

/// A run attempt that did not produce a committed boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFailure {
    pub timeframe: Timeframe,
    pub boundary: i64,
    pub source: RunSource,
    pub stage: FailureStage,
    pub message: String,
}

pub trait FailureReporter: Send + Sync {
    fn report(&self, failure: &RunFailure);
}
