//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; the authority token comes from
//! the `CADENCE_ORACLE_TOKEN` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use cadence::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::runtime::{SchedulerConfig, WatchdogConfig};
use super::service::{MarketConfig, OracleConfig, RunnerConfig, UpstreamConfig};
use super::storage::{SinkConfig, StateConfig};
use crate::domain::{ModelConfig, Timeframe};
use crate::error::{ConfigError, Result};

/// Environment variable holding the authority bearer token.
pub const ORACLE_TOKEN_ENV: &str = "CADENCE_ORACLE_TOKEN";

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Path to the status file for external monitoring.
    #[serde(default)]
    pub status_file: Option<PathBuf>,

    /// Seconds between periodic status file refreshes.
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,

    /// Start in paper mode instead of live.
    #[serde(default)]
    pub paper: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub sink: SinkConfig,

    #[serde(default)]
    pub watchdog: WatchdogConfig,

    /// Model parameters keyed by timeframe label (`[models.4h]`).
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,
}

fn default_status_interval_secs() -> u64 {
    30
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        // Never from the config file.
        config.oracle.token = std::env::var(ORACLE_TOKEN_ENV)
            .ok()
            .filter(|token| !token.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Model configs keyed by parsed timeframe.
    #[allow(clippy::result_large_err)]
    pub fn model_configs(&self) -> Result<BTreeMap<Timeframe, ModelConfig>> {
        let mut out = BTreeMap::new();
        for (label, model) in &self.models {
            let timeframe: Timeframe = label.parse().map_err(|reason| ConfigError::InvalidValue {
                field: "models",
                reason,
            })?;
            model.validate()?;
            out.insert(timeframe, model.clone());
        }
        Ok(out)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(ConfigError::MissingField { field: "models" }.into());
        }
        self.model_configs()?;

        if self.runner.program.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "runner.program",
            }
            .into());
        }
        if self.runner.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "runner.timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.oracle.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "oracle.url" }.into());
        }
        url::Url::parse(&self.oracle.url).map_err(|e| ConfigError::InvalidValue {
            field: "oracle.url",
            reason: e.to_string(),
        })?;
        if self.oracle.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "oracle.timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.market.url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "market.url" }.into());
        }
        url::Url::parse(&self.market.url).map_err(|e| ConfigError::InvalidValue {
            field: "market.url",
            reason: e.to_string(),
        })?;
        if self.scheduler.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scheduler.poll_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.upstream.endpoint.is_some() && self.upstream.reconnect_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upstream.reconnect_delay_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sink.retention == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sink.retention",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.watchdog.enabled && self.watchdog.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "watchdog.interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.status_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "status_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::upstream::UpstreamEndpoint;
    use crate::error::Error;

    const MINIMAL: &str = r#"
[runner]
program = "/usr/bin/model"

[oracle]
url = "http://127.0.0.1:9000/runs"

[market]
url = "http://127.0.0.1:9000"

[models.4h]
formula = "macd"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::parse_toml(MINIMAL).unwrap();
        assert_eq!(config.runner.timeout_ms, 30_000);
        assert_eq!(config.oracle.timeout_ms, 10_000);
        assert_eq!(config.upstream.reconnect_delay_ms, 2000);
        assert!(config.upstream.endpoint.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(!config.watchdog.enabled);

        let models = config.model_configs().unwrap();
        assert_eq!(models[&Timeframe::H4].slow_length, 26);
    }

    #[test]
    fn unknown_timeframe_label_is_rejected() {
        let content = MINIMAL.replace("[models.4h]", "[models.2h]");
        assert!(matches!(
            Config::parse_toml(&content),
            Err(Error::Config(ConfigError::InvalidValue { field: "models", .. }))
        ));
    }

    #[test]
    fn missing_runner_program_is_rejected() {
        let content = MINIMAL.replace("program = \"/usr/bin/model\"", "");
        assert!(matches!(
            Config::parse_toml(&content),
            Err(Error::Config(ConfigError::MissingField {
                field: "runner.program"
            }))
        ));
    }

    #[test]
    fn invalid_model_parameters_are_rejected() {
        let content = format!("{MINIMAL}fast_length = 40\nslow_length = 20\n");
        assert!(matches!(
            Config::parse_toml(&content),
            Err(Error::Config(ConfigError::InvalidValue {
                field: "fast_length",
                ..
            }))
        ));
    }

    #[test]
    fn upstream_endpoint_is_parsed() {
        let content = format!("[upstream]\nendpoint = \"tcp:127.0.0.1:7000\"\n{MINIMAL}");
        let config = Config::parse_toml(&content).unwrap();
        assert_eq!(
            config.upstream.endpoint,
            Some(UpstreamEndpoint::Tcp("127.0.0.1:7000".into()))
        );
    }
}
