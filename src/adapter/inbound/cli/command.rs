//! Command-line interface definitions.
//!
//! Defines the CLI structure for the cadence binary using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default configuration file location.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Default status file location read by `cadence status`.
pub const DEFAULT_STATUS_FILE: &str = "cadence-status.json";

/// Boundary-driven model runner
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler and orchestrator in the foreground
    Run(RunArgs),

    /// Show the status of a running instance
    Status(StatusArgs),

    /// Validate configuration and local environment
    Check(ConfigPathArg),
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Start in paper mode regardless of the config file.
    #[arg(long)]
    pub paper: bool,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Status file written by a running instance.
    #[arg(long, default_value = DEFAULT_STATUS_FILE)]
    pub status_file: PathBuf,

    /// JSON output for scripting
    #[arg(long)]
    pub json: bool,
}
