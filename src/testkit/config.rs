//! Canonical test configurations.
//!
//! Single source of truth for config TOML used across tests.

use crate::infrastructure::config::settings::Config;

/// Sections every valid config needs besides `[runner]`.
pub const BASE: &str = r#"
[oracle]
url = "http://127.0.0.1:9000/runs"

[market]
url = "http://127.0.0.1:9000"

[models.4h]
formula = "macd"
"#;

/// Smallest valid config.
pub fn minimal_toml() -> String {
    format!("[runner]\nprogram = \"/usr/bin/model\"\n{BASE}")
}

/// Parsed [`minimal_toml`].
pub fn config() -> Config {
    config_with("")
}

/// Minimal config with `sections` prepended.
///
/// A default `[runner]` is supplied unless `sections` declares one.
pub fn config_with(sections: &str) -> Config {
    let content = if sections.contains("[runner]") {
        format!("{sections}\n{BASE}")
    } else {
        format!("{sections}\n{}", minimal_toml())
    };
    Config::parse_toml(&content).expect("test config must parse")
}
