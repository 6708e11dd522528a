//! Process-wide operating mode.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::run::RunSource;

/// Which trigger source is authoritative. Exactly one is active; events from
/// the other are dropped, not queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Wall-clock boundary scheduler drives runs.
    #[default]
    Live,
    /// Upstream replay pushes candle batches.
    Paper,
}

impl Mode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Paper => "paper",
        }
    }

    /// Run source whose triggers this mode honors.
    #[must_use]
    pub const fn source(self) -> RunSource {
        match self {
            Self::Live => RunSource::Live,
            Self::Paper => RunSource::Paper,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
