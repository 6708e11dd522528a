//! Terminal output helpers.
//!
//! Human-readable lines styled with `owo-colors`, plus a JSON mode for
//! scripting and a quiet mode that suppresses everything but warnings and
//! errors.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Apply output settings from CLI flags.
pub fn configure(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Switch JSON mode on or off, keeping the other settings.
pub fn set_json(json: bool) {
    configure(OutputConfig {
        json,
        ..read_config()
    });
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

#[must_use]
pub fn is_quiet() -> bool {
    read_config().quiet
}

fn suppressed() -> bool {
    let config = read_config();
    config.json || config.quiet
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    if suppressed() {
        return;
    }
    println!("{} {}", "cadence".bold(), version.dimmed());
    println!();
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    if suppressed() {
        return;
    }
    println!("  {:<12} {}", label.dimmed(), value);
}

/// Print a section header.
pub fn section(title: &str) {
    if suppressed() {
        return;
    }
    println!();
    println!("{}", title.bold());
}

/// Print a success line.
pub fn success(message: &str) {
    if suppressed() {
        return;
    }
    println!("  {} {}", "✓".green(), message);
}

/// Print a warning line.
pub fn warning(message: &str) {
    if is_json() {
        return;
    }
    println!("  {} {}", "⚠".yellow(), message);
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", serde_json::json!({ "error": message }));
        return;
    }
    eprintln!("  {} {}", "×".red(), message);
}

/// Print a block of preformatted text, such as a rendered table.
pub fn block(text: impl Display) {
    if suppressed() {
        return;
    }
    println!("{text}");
}

/// Print a JSON document on stdout.
pub fn json_output(value: serde_json::Value) {
    println!("{value}");
}

/// Format a positive value in green.
pub fn positive(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    format!("{}", value.green())
}

/// Format a negative value in red.
pub fn negative(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    format!("{}", value.red())
}

/// Format a dimmed/muted value.
pub fn muted(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    format!("{}", value.dimmed())
}
