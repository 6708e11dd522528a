//! Durable last-run state port.

use std::collections::HashMap;

use crate::domain::{RunSource, Timeframe};
use crate::error::StateError;

/// Highest acknowledged boundary per timeframe.
pub type LastRuns = HashMap<Timeframe, i64>;

/// Small persisted mapping that survives restarts.
///
/// Written after every acknowledged run and read at startup and when
/// returning to live mode.
pub trait LastRunStore: Send + Sync {
    /// Load the persisted boundaries for a source. Missing state is empty.
    fn load(&self, source: RunSource) -> Result<LastRuns, StateError>;

    /// Replace the persisted boundaries for a source.
    fn save(&self, source: RunSource, runs: &LastRuns) -> Result<(), StateError>;
}
