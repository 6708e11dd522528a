//! Handler for the `run` command.

use tokio::sync::watch;
use tracing::info;

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime::run_with_shutdown;

/// Execute the run command until Ctrl-C.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if args.paper {
        config.paper = true;
    }
    config.init_logging();
    print_startup(&args.config.display().to_string(), &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
        }
        let _ = shutdown_tx.send(true);
    });

    run_with_shutdown(config, shutdown_rx).await
}

fn print_startup(path: &str, config: &Config) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Config", path);
    output::field("Mode", if config.paper { "paper" } else { "live" });
    output::field(
        "Timeframes",
        config.models.keys().cloned().collect::<Vec<_>>().join(", "),
    );
    output::field("Runner", &config.runner.program);
    match &config.upstream.endpoint {
        Some(endpoint) => output::field("Upstream", endpoint),
        None => output::field("Upstream", output::muted("none")),
    }
    if let Some(path) = &config.status_file {
        output::field("Status", path.display());
    }
    if config.oracle.token.is_none() {
        output::warning("CADENCE_ORACLE_TOKEN not set; acknowledgments are unauthenticated");
    }
}
