//! Durable state and result history settings.

use std::path::PathBuf;

use serde::Deserialize;

/// Directory holding `last-run-<source>.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
        }
    }
}

/// In-memory result history and broadcast fan-out.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Records kept per (timeframe, source).
    #[serde(default = "default_retention")]
    pub retention: usize,
    /// Events buffered per broadcast subscriber before it starts lagging.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_retention() -> usize {
    500
}

fn default_broadcast_capacity() -> usize {
    256
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            retention: default_retention(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}
