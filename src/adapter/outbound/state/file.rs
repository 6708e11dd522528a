//! JSON-file last-run store.
//!
//! One file per source under the state directory, e.g.
//! `last-run-live.json` containing `{"4h": 1700000000000}`. Writes go to a
//! temp file which is then renamed over the target.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{RunSource, Timeframe};
use crate::error::StateError;
use crate::port::outbound::state::{LastRunStore, LastRuns};

/// Write `bytes` to `path` via temp file and rename. Creates the parent
/// directory when missing.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let cleanup_and_err = |e| {
        let _ = fs::remove_file(&temp_path);
        e
    };

    let mut file = fs::File::create(&temp_path)?;
    file.write_all(bytes).map_err(cleanup_and_err)?;
    file.sync_all().map_err(cleanup_and_err)?;
    fs::rename(&temp_path, path).map_err(cleanup_and_err)?;
    Ok(())
}

/// Last-run store backed by small JSON files.
#[derive(Debug, Clone)]
pub struct JsonFileLastRunStore {
    dir: PathBuf,
}

impl JsonFileLastRunStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path(&self, source: RunSource) -> PathBuf {
        self.dir.join(format!("last-run-{source}.json"))
    }
}

impl LastRunStore for JsonFileLastRunStore {
    fn load(&self, source: RunSource) -> Result<LastRuns, StateError> {
        let path = self.path(source);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LastRuns::new()),
            Err(source) => {
                return Err(StateError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(LastRuns::new());
        }

        serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    }

    fn save(&self, source: RunSource, runs: &LastRuns) -> Result<(), StateError> {
        let path = self.path(source);
        let ordered: BTreeMap<Timeframe, i64> = runs.iter().map(|(k, v)| (*k, *v)).collect();
        let json = serde_json::to_vec_pretty(&ordered).map_err(StateError::Encode)?;

        write_atomic(&path, &json).map_err(|source| StateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), entries = ordered.len(), "Persisted last-run state");
        Ok(())
    }
}
