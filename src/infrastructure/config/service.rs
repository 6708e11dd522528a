//! External service endpoints: runner binary, upstream, authority, market data.

use std::time::Duration;

use serde::Deserialize;

use crate::adapter::outbound::upstream::UpstreamEndpoint;

/// Model runner subprocess.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    /// Path to the runner executable.
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_runner_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_runner_timeout_ms() -> u64 {
    30_000
}

impl RunnerConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Upstream event source. Disabled when `endpoint` is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub endpoint: Option<UpstreamEndpoint>,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    2000
}

impl UpstreamConfig {
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Acknowledging authority.
///
/// The bearer token is read from `CADENCE_ORACLE_TOKEN`, never from the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(skip)]
    pub token: Option<String>,
}

impl OracleConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Market-data candle source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

impl MarketConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_http_timeout_ms() -> u64 {
    10_000
}
