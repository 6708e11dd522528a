//! In-memory result history with per-series retention.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use tracing::debug;

use crate::domain::{RunSource, Timeframe};
use crate::port::outbound::sink::{ResultSink, RunRecord};

type Series = BTreeMap<i64, RunRecord>;

/// Keeps at most `retention` committed runs per (timeframe, source), keyed
/// by boundary so a re-committed boundary replaces the earlier record.
pub struct MemoryResultSink {
    retention: usize,
    series: RwLock<HashMap<(Timeframe, RunSource), Series>>,
}

impl MemoryResultSink {
    #[must_use]
    pub fn new(retention: usize) -> Self {
        Self {
            retention: retention.max(1),
            series: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.read().values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultSink for MemoryResultSink {
    fn record(&self, record: RunRecord) {
        let key = (record.envelope.timeframe, record.envelope.source);
        let mut series = self.series.write();
        let entries = series.entry(key).or_default();
        entries.insert(record.envelope.boundary, record);
        while entries.len() > self.retention {
            entries.pop_first();
        }
    }

    fn purge(&self, source: RunSource) -> usize {
        let mut series = self.series.write();
        let mut removed = 0;
        series.retain(|(_, s), entries| {
            if *s == source {
                removed += entries.len();
                false
            } else {
                true
            }
        });
        debug!(source = %source, removed, "Purged results");
        removed
    }

    fn recent(&self, timeframe: Timeframe, source: RunSource, limit: usize) -> Vec<RunRecord> {
        self.series
            .read()
            .get(&(timeframe, source))
            .map(|entries| entries.values().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RunEnvelope;
    use crate::testkit::domain::{model_config, runner_output};
    use chrono::Utc;

    fn record(tf: Timeframe, boundary: i64, source: RunSource, id: i64) -> RunRecord {
        RunRecord {
            envelope: RunEnvelope::new(
                tf,
                boundary,
                source,
                model_config("macd"),
                runner_output(id),
            ),
            authority_id: id,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn keeps_newest_within_retention() {
        let sink = MemoryResultSink::new(2);
        for b in 1..=3 {
            sink.record(record(Timeframe::H4, b, RunSource::Live, b));
        }
        let recent = sink.recent(Timeframe::H4, RunSource::Live, 10);
        let boundaries: Vec<_> = recent.iter().map(|r| r.envelope.boundary).collect();
        assert_eq!(boundaries, vec![3, 2]);
    }

    #[test]
    fn same_boundary_replaces_record() {
        let sink = MemoryResultSink::new(10);
        sink.record(record(Timeframe::H4, 1, RunSource::Live, 1));
        sink.record(record(Timeframe::H4, 1, RunSource::Live, 2));
        let recent = sink.recent(Timeframe::H4, RunSource::Live, 10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].authority_id, 2);
    }

    #[test]
    fn purge_only_touches_one_source() {
        let sink = MemoryResultSink::new(10);
        sink.record(record(Timeframe::H4, 1, RunSource::Live, 1));
        sink.record(record(Timeframe::H4, 1, RunSource::Paper, 2));
        sink.record(record(Timeframe::D1, 1, RunSource::Paper, 3));

        assert_eq!(sink.purge(RunSource::Paper), 2);
        assert_eq!(sink.len(), 1);
        assert!(sink.recent(Timeframe::H4, RunSource::Paper, 10).is_empty());
    }
}
