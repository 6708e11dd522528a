//! Status file for external monitoring.
//!
//! Writes a JSON status file that `cadence status` and other tools can poll
//! to see the mode, last committed boundaries and run counters of a running
//! instance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::adapter::outbound::state::write_atomic;
use crate::application::RunCounts;
use crate::domain::{Mode, Timeframe};
use crate::error::Result;
use crate::port::inbound::control::StatusSnapshot;

/// Current status file format version.
const STATUS_VERSION: &str = "1";

/// Top-level status file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusFile {
    /// Schema version for forward compatibility.
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub pid: u32,
    pub mode: Mode,
    pub timeframes: Vec<Timeframe>,
    /// Last acknowledged live boundary per timeframe.
    pub last_run: BTreeMap<Timeframe, i64>,
    #[serde(default)]
    pub paper_last_run: BTreeMap<Timeframe, i64>,
    pub upstream_connected: bool,
    pub runs: RunCounts,
    /// When this file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl StatusFile {
    /// Read and parse a status file written by [`StatusWriter`].
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Writer for the status file.
///
/// Thread-safe wrapper that manages atomic updates to the status file.
pub struct StatusWriter {
    path: PathBuf,
    status: Mutex<StatusFile>,
}

impl StatusWriter {
    #[must_use]
    pub fn new(path: PathBuf, timeframes: Vec<Timeframe>) -> Self {
        let now = Utc::now();
        let status = StatusFile {
            version: STATUS_VERSION.to_string(),
            started_at: now,
            pid: std::process::id(),
            mode: Mode::default(),
            timeframes,
            last_run: BTreeMap::new(),
            paper_last_run: BTreeMap::new(),
            upstream_connected: false,
            runs: RunCounts::default(),
            updated_at: now,
        };
        Self {
            path,
            status: Mutex::new(status),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the orchestrator's view into the pending status.
    pub fn update(&self, snapshot: &StatusSnapshot, runs: RunCounts) {
        let mut status = self.status.lock();
        status.mode = snapshot.mode;
        status.timeframes.clone_from(&snapshot.timeframes);
        status.last_run.clone_from(&snapshot.last_run);
        status.paper_last_run.clone_from(&snapshot.paper_last_run);
        status.upstream_connected = snapshot.upstream_connected;
        status.runs = runs;
    }

    /// Write the current status to the file atomically.
    #[allow(clippy::result_large_err)]
    pub fn write(&self) -> Result<()> {
        // Serialize under the lock, write without it.
        let json = {
            let mut status = self.status.lock();
            status.updated_at = Utc::now();
            serde_json::to_string_pretty(&*status)?
        };
        write_atomic(&self.path, json.as_bytes())?;
        Ok(())
    }
}
