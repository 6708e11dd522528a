use thiserror::Error;

use crate::domain::{Mode, Timeframe};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failures of a single model runner invocation.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to spawn runner '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("runner timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("runner exited with {}: {stderr}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("runner produced malformed output: {source}")]
    MalformedOutput {
        #[source]
        source: serde_json::Error,
        stdout: String,
    },

    #[error("runner I/O failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("failed to encode runner input: {0}")]
    Encode(#[source] serde_json::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "signal".to_string(),
    }
}

/// Reasons the acknowledging authority did not confirm a run.
#[derive(Error, Debug)]
pub enum AckError {
    #[error("authority request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("authority rejected run with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("authority response missing identifier: {0}")]
    InvalidResponse(String),
}

/// Durable last-run store failures.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("state I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("state encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error(transparent)]
    Ack(#[from] AckError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("operation requires {expected} mode but current mode is {actual}")]
    ModeMismatch { expected: Mode, actual: Mode },

    #[error("timeframe {0} is not tracked")]
    UnknownTimeframe(Timeframe),

    #[error("candle source failed: {0}")]
    Candles(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{failed} critical health check(s) failed")]
    Unhealthy { failed: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
