//! Result sink port: history of committed runs.

use chrono::{DateTime, Utc};

use crate::domain::{RunEnvelope, RunSource, Timeframe};

/// A committed run as stored in the history.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub envelope: RunEnvelope,
    pub authority_id: i64,
    pub recorded_at: DateTime<Utc>,
}

pub trait ResultSink: Send + Sync {
    /// Store a committed run, replacing any earlier record with the same
    /// (timeframe, boundary, source) identity.
    fn record(&self, record: RunRecord);

    /// Drop every record produced by `source`. Returns how many were removed.
    fn purge(&self, source: RunSource) -> usize;

    /// Most recent records for a timeframe and source, newest first.
    fn recent(&self, timeframe: Timeframe, source: RunSource, limit: usize) -> Vec<RunRecord>;
}
