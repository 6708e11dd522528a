use clap::Parser;

use cadence::adapter::inbound::cli::command::{Cli, ColorChoice, Commands};
use cadence::adapter::inbound::cli::output::{self, OutputConfig};
use cadence::adapter::inbound::cli::{check, run, status};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(OutputConfig {
        json: false,
        quiet: cli.quiet,
    });

    let result = match &cli.command {
        Commands::Run(args) => run::execute(args).await,
        Commands::Status(args) => status::execute(&args.status_file, args.json),
        Commands::Check(args) => check::execute(&args.config),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
