//! Runner input/output contract and the run envelope.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::candle::Candle;
use super::model::{MaType, ModelConfig};
use super::timeframe::Timeframe;

/// Which trigger stream produced a run. Live and paper boundaries never
/// collide because the source is part of a run's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunSource {
    Live,
    Paper,
}

impl RunSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Paper => "paper",
        }
    }
}

impl fmt::Display for RunSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Algorithm options forwarded to the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOptions {
    pub ma_type: MaType,
    pub slow_length: u32,
    pub fast_length: u32,
    pub signal_smoothing: u32,
}

/// JSON document written to the runner's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerInput {
    pub formula: String,
    pub signal: Vec<f64>,
    pub options: RunnerOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<bool>,
}

/// Extract the configured price field from each candle and pair it with the
/// config's algorithm parameters.
#[must_use]
pub fn build_input(candles: &[Candle], config: &ModelConfig) -> RunnerInput {
    RunnerInput {
        formula: config.formula.clone(),
        signal: candles.iter().map(|c| c.price(config.price_field)).collect(),
        options: RunnerOptions {
            ma_type: config.ma_type,
            slow_length: config.slow_length,
            fast_length: config.fast_length,
            signal_smoothing: config.signal_smoothing,
        },
        trace: config.trace.then_some(true),
    }
}

/// Parsed runner stdout. Only `runId` is required; every other field is kept
/// verbatim for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOutput {
    #[serde(rename = "runId")]
    pub run_id: i64,
    /// Input signal as real values, attached after the run.
    #[serde(rename = "rawSignal", default, skip_serializing_if = "Vec::is_empty")]
    pub raw_signal: Vec<f64>,
    #[serde(flatten)]
    pub series: Map<String, Value>,
}

/// Successful runner invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub output: RunnerOutput,
    pub duration_ms: u64,
}

/// How a run attempt ended without a hard error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No candles; the runner was not invoked.
    Skipped,
    /// The trigger's source is not the active mode.
    Dropped,
    /// The same (timeframe, boundary, source) is already executing.
    AlreadyRunning,
    /// The boundary is already durably committed.
    AlreadyCommitted,
    /// Acknowledged and persisted.
    Committed { authority_id: i64 },
    /// Computed but not acknowledged; nothing persisted.
    Unacknowledged { reason: String },
}

impl RunOutcome {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Complete record of one computation pass, submitted for acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEnvelope {
    pub timeframe: Timeframe,
    pub boundary: i64,
    pub model_date: String,
    pub run_id: i64,
    pub source: RunSource,
    pub formula: String,
    pub args: ModelConfig,
    pub output: RunnerOutput,
}

impl RunEnvelope {
    pub fn new(
        timeframe: Timeframe,
        boundary: i64,
        source: RunSource,
        config: ModelConfig,
        output: RunnerOutput,
    ) -> Self {
        Self {
            timeframe,
            boundary,
            model_date: model_date(boundary),
            run_id: output.run_id,
            source,
            formula: config.formula.clone(),
            args: config,
            output,
        }
    }
}

/// RFC 3339 rendering of a boundary; falls back to the raw number when the
/// timestamp is outside chrono's range.
fn model_date(boundary: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(boundary).map_or_else(
        || boundary.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true),
    )
}
