//! Handler for the `check` command.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::{Error, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::health::{health_check, HealthStatus};

/// Validate the configuration file and local environment without running.
pub fn execute(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let report = health_check(&config);

    output::section("Configuration");
    output::field("Config", config_path.display());
    output::success("Configuration file is valid");

    output::section("Environment");
    for check in report.checks() {
        match check.status() {
            HealthStatus::Healthy => output::success(check.name()),
            HealthStatus::Unhealthy(reason) if check.critical() => {
                output::error(&format!("{}: {reason}", check.name()));
            }
            HealthStatus::Unhealthy(reason) => {
                output::warning(&format!("{}: {reason}", check.name()));
            }
        }
    }

    let failed = report
        .checks()
        .iter()
        .filter(|check| check.critical() && !check.is_healthy())
        .count();
    if failed > 0 {
        return Err(Error::Unhealthy { failed });
    }
    output::success("All critical checks passed");
    Ok(())
}
