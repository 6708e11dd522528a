//! Preflight health reporting.

use std::path::Path;

use crate::adapter::outbound::upstream::UpstreamEndpoint;
use crate::infrastructure::config::settings::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    /// True when every critical check passed.
    pub fn is_healthy(&self) -> bool {
        self.checks
            .iter()
            .filter(|check| check.critical())
            .all(HealthCheck::is_healthy)
    }
}

/// Check the local environment `config` will run in.
///
/// Only inspects the filesystem; nothing is connected to or spawned.
pub fn health_check(config: &Config) -> HealthReport {
    let mut checks = Vec::new();

    checks.push(HealthCheck {
        name: "runner",
        critical: true,
        status: runner_status(&config.runner.program),
    });

    checks.push(HealthCheck {
        name: "state_dir",
        critical: true,
        status: state_dir_status(&config.state.dir),
    });

    checks.push(HealthCheck {
        name: "models",
        critical: true,
        status: match config.model_configs() {
            Ok(models) if models.is_empty() => {
                HealthStatus::Unhealthy("no timeframes configured".to_string())
            }
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        },
    });

    checks.push(HealthCheck {
        name: "upstream",
        critical: false,
        status: match &config.upstream.endpoint {
            None => HealthStatus::Unhealthy("no endpoint configured; paper mode unavailable".to_string()),
            Some(UpstreamEndpoint::Unix(path)) if !path.exists() => HealthStatus::Unhealthy(
                format!("socket {} does not exist yet", path.display()),
            ),
            Some(_) => HealthStatus::Healthy,
        },
    });

    HealthReport { checks }
}

fn runner_status(program: &str) -> HealthStatus {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return if path.is_file() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy(format!("{} not found", path.display()))
        };
    }

    let found = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false);
    if found {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy(format!("{program} not found on PATH"))
    }
}

fn state_dir_status(dir: &Path) -> HealthStatus {
    if let Err(e) = std::fs::create_dir_all(dir) {
        return HealthStatus::Unhealthy(format!("cannot create {}: {e}", dir.display()));
    }
    let probe = dir.join(".cadence-probe");
    match std::fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            HealthStatus::Healthy
        }
        Err(e) => HealthStatus::Unhealthy(format!("{} not writable: {e}", dir.display())),
    }
}
