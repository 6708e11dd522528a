//! Composition root: builds adapters from configuration and wires them into
//! the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::config::settings::Config;
use super::runtime::Application;
use super::status_file::StatusWriter;
use crate::adapter::outbound::market::HttpCandleSource;
use crate::adapter::outbound::notifier::BroadcastNotifier;
use crate::adapter::outbound::oracle::HttpAcknowledger;
use crate::adapter::outbound::report::TracingReporter;
use crate::adapter::outbound::runner::ProcessRunner;
use crate::adapter::outbound::sink::MemoryResultSink;
use crate::adapter::outbound::state::JsonFileLastRunStore;
use crate::adapter::outbound::upstream::UpstreamSubscriber;
use crate::application::{
    BoundaryScheduler, Collaborators, ModelConfigStore, Orchestrator, Watchdog,
};
use crate::error::Result;
use crate::port::inbound::control::ControlPort;
use crate::port::outbound::clock::{Clock, SystemClock};
use crate::port::outbound::notifier::{LogNotifier, NotifierRegistry};
use crate::port::outbound::upstream::UpstreamLink;

/// Log notifier plus the in-process broadcast channel.
pub(crate) fn build_notifier_registry(
    config: &Config,
) -> (NotifierRegistry, Arc<BroadcastNotifier>) {
    let broadcast = Arc::new(BroadcastNotifier::new(config.sink.broadcast_capacity));
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry.register(Box::new(Arc::clone(&broadcast)));
    (registry, broadcast)
}

pub(crate) fn build_runner(config: &Config) -> ProcessRunner {
    ProcessRunner::new(config.runner.program.clone())
        .with_args(config.runner.args.clone())
        .with_timeout(config.runner.timeout())
}

pub(crate) fn build_acknowledger(config: &Config) -> HttpAcknowledger {
    HttpAcknowledger::new(
        config.oracle.url.clone(),
        config.oracle.timeout(),
        config.oracle.token.clone(),
    )
}

/// Build every collaborator and the orchestrator, ready to run.
#[allow(clippy::result_large_err)]
pub fn build_application(config: &Config) -> Result<Application> {
    let configs = ModelConfigStore::new(config.model_configs()?);
    let timeframes = configs.timeframes();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (scheduler, triggers) = BoundaryScheduler::new(
        timeframes.clone(),
        config.scheduler.poll_interval(),
        Arc::clone(&clock),
    );

    let (notifiers, broadcast) = build_notifier_registry(config);
    info!(notifiers = notifiers.len(), "Notifiers initialized");

    let (subscriber, upstream_events) = match &config.upstream.endpoint {
        Some(endpoint) => {
            let (subscriber, rx) =
                UpstreamSubscriber::new(endpoint.clone(), config.upstream.reconnect_delay());
            info!(endpoint = %endpoint, "Upstream subscriber configured");
            (Some(Arc::new(subscriber)), Some(rx))
        }
        None => {
            info!("No upstream endpoint configured; paper mode can only be entered manually");
            (None, None)
        }
    };

    let services = Collaborators {
        runner: Arc::new(build_runner(config)),
        acknowledger: Arc::new(build_acknowledger(config)),
        store: Arc::new(JsonFileLastRunStore::new(config.state.dir.clone())),
        sink: Arc::new(MemoryResultSink::new(config.sink.retention)),
        candles: Arc::new(HttpCandleSource::new(
            config.market.url.clone(),
            config.market.timeout(),
        )),
        reporter: Arc::new(TracingReporter),
        notifiers,
        upstream: subscriber
            .as_ref()
            .map(|s| Arc::clone(s) as Arc<dyn UpstreamLink>),
        clock: Arc::clone(&clock),
    };

    let orchestrator = Arc::new(Orchestrator::new(configs, scheduler, services));
    if config.paper {
        orchestrator.paper_on();
    }

    let mut app = Application::new(orchestrator, triggers).with_broadcast(broadcast);
    if let (Some(subscriber), Some(rx)) = (subscriber, upstream_events) {
        app = app.with_upstream(Some(subscriber), rx);
    }
    if config.watchdog.enabled {
        let watchdog = Watchdog::new(
            Arc::clone(app.orchestrator()),
            clock,
            Duration::from_secs(config.watchdog.grace_secs),
        );
        app = app.with_watchdog(watchdog, Duration::from_secs(config.watchdog.interval_secs));
        info!(
            interval_secs = config.watchdog.interval_secs,
            grace_secs = config.watchdog.grace_secs,
            "Watchdog enabled"
        );
    }
    if let Some(path) = &config.status_file {
        app = app.with_status(
            StatusWriter::new(path.clone(), timeframes),
            Duration::from_secs(config.status_interval_secs),
        );
        info!(path = %path.display(), "Status file writer initialized");
    }
    Ok(app)
}
