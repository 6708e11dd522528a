//! Run counters surfaced in the status file.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free counters updated by the run protocol.
#[derive(Debug, Default)]
pub struct RunStats {
    attempted: AtomicU64,
    committed: AtomicU64,
    unacknowledged: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Copy of [`RunStats`] at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    pub attempted: u64,
    pub committed: u64,
    pub unacknowledged: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl RunStats {
    pub fn attempted(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn committed(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unacknowledged(&self) {
        self.unacknowledged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counts(&self) -> RunCounts {
        RunCounts {
            attempted: self.attempted.load(Ordering::Relaxed),
            committed: self.committed.load(Ordering::Relaxed),
            unacknowledged: self.unacknowledged.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
