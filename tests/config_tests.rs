use std::fs;

use cadence::domain::Timeframe;
use cadence::error::{ConfigError, Error};
use cadence::infrastructure::config::settings::Config;
use cadence::testkit::config::{config_with, minimal_toml};

#[test]
fn loads_full_config_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
status_file = "/tmp/cadence-status.json"
paper = true

[logging]
level = "debug"
format = "json"

[scheduler]
poll_interval_ms = 250

[runner]
program = "/opt/model/bin/run"
args = ["--quiet"]
timeout_ms = 5000

[upstream]
endpoint = "unix:/tmp/upstream.sock"
reconnect_delay_ms = 500

[oracle]
url = "https://authority.example/runs"

[market]
url = "https://candles.example"

[state]
dir = "/var/lib/cadence"

[watchdog]
enabled = true
grace_secs = 30

[models.15m]
formula = "macd"
slow_length = 10
fast_length = 4

[models.1d]
formula = "ppo"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert!(config.paper);
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.scheduler.poll_interval_ms, 250);
    assert_eq!(config.runner.args, vec!["--quiet".to_string()]);
    assert_eq!(config.runner.timeout().as_millis(), 5000);
    assert_eq!(config.upstream.reconnect_delay().as_millis(), 500);
    assert!(config.watchdog.enabled);
    assert_eq!(config.watchdog.interval_secs, 60);

    let models = config.model_configs().unwrap();
    assert_eq!(
        models.keys().copied().collect::<Vec<_>>(),
        vec![Timeframe::M15, Timeframe::D1]
    );
    assert_eq!(models[&Timeframe::M15].slow_length, 10);
    assert_eq!(models[&Timeframe::D1].formula, "ppo");
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Config::load(dir.path().join("absent.toml")),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    assert!(matches!(
        Config::parse_toml("[runner\nprogram = 1"),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn config_without_models_is_rejected() {
    let content = minimal_toml().replace("[models.4h]\nformula = \"macd\"\n", "");
    assert!(matches!(
        Config::parse_toml(&content),
        Err(Error::Config(ConfigError::MissingField { field: "models" }))
    ));
}

#[test]
fn invalid_authority_url_is_rejected() {
    let content = minimal_toml().replace("http://127.0.0.1:9000/runs", "not a url");
    assert!(matches!(
        Config::parse_toml(&content),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "oracle.url",
            ..
        }))
    ));
}

#[test]
fn zero_runner_timeout_is_rejected() {
    let content = minimal_toml().replace(
        "program = \"/usr/bin/model\"",
        "program = \"/usr/bin/model\"\ntimeout_ms = 0",
    );
    assert!(matches!(
        Config::parse_toml(&content),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "runner.timeout_ms",
            ..
        }))
    ));
}

#[test]
fn defaults_apply_to_minimal_config() {
    let config = config_with("");
    assert!(!config.paper);
    assert!(config.status_file.is_none());
    assert_eq!(config.status_interval_secs, 30);
    assert_eq!(config.sink.retention, 500);
    assert_eq!(config.state.dir.to_str(), Some("state"));
}
