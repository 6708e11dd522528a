//! Runtime loop.
//!
//! A single task multiplexes shutdown, scheduler triggers, upstream events,
//! watchdog and status ticks. Each run is spawned onto a [`JoinSet`] so
//! timeframes proceed concurrently; mode checks happen in the loop before
//! spawning so they stay ordered with upstream transitions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::config::settings::Config;
use super::status_file::StatusWriter;
use crate::adapter::outbound::notifier::BroadcastNotifier;
use crate::adapter::outbound::upstream::UpstreamSubscriber;
use crate::application::{Orchestrator, Trigger, Watchdog};
use crate::domain::RunOutcome;
use crate::error::Result;
use crate::port::inbound::control::ControlPort;
use crate::port::outbound::upstream::UpstreamEvent;

/// Wired application ready to be driven by [`Application::run`].
pub struct Application {
    orchestrator: Arc<Orchestrator>,
    triggers: mpsc::UnboundedReceiver<Trigger>,
    subscriber: Option<Arc<UpstreamSubscriber>>,
    upstream_events: Option<mpsc::UnboundedReceiver<UpstreamEvent>>,
    broadcast: Option<Arc<BroadcastNotifier>>,
    watchdog: Option<(Watchdog, Duration)>,
    status: Option<(StatusWriter, Duration)>,
}

impl Application {
    #[must_use]
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        triggers: mpsc::UnboundedReceiver<Trigger>,
    ) -> Self {
        Self {
            orchestrator,
            triggers,
            subscriber: None,
            upstream_events: None,
            broadcast: None,
            watchdog: None,
            status: None,
        }
    }

    /// Feed upstream events from `events`; `subscriber`, when given, is
    /// connected on start.
    #[must_use]
    pub fn with_upstream(
        mut self,
        subscriber: Option<Arc<UpstreamSubscriber>>,
        events: mpsc::UnboundedReceiver<UpstreamEvent>,
    ) -> Self {
        self.subscriber = subscriber;
        self.upstream_events = Some(events);
        self
    }

    #[must_use]
    pub fn with_broadcast(mut self, broadcast: Arc<BroadcastNotifier>) -> Self {
        self.broadcast = Some(broadcast);
        self
    }

    #[must_use]
    pub fn with_watchdog(mut self, watchdog: Watchdog, every: Duration) -> Self {
        self.watchdog = Some((watchdog, every));
        self
    }

    #[must_use]
    pub fn with_status(mut self, writer: StatusWriter, every: Duration) -> Self {
        self.status = Some((writer, every));
        self
    }

    #[must_use]
    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// In-process event stream, when configured.
    #[must_use]
    pub fn broadcast(&self) -> Option<&Arc<BroadcastNotifier>> {
        self.broadcast.as_ref()
    }

    /// Drive the application until `shutdown` flips to true or its sender is
    /// dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let Self {
            orchestrator,
            mut triggers,
            subscriber,
            mut upstream_events,
            broadcast: _broadcast,
            watchdog,
            status,
        } = self;

        orchestrator.start();
        if let Some(subscriber) = &subscriber {
            subscriber.connect();
        }

        let (watchdog, mut watchdog_tick) = match watchdog {
            Some((watchdog, every)) => (Some(watchdog), Some(ticker(every))),
            None => (None, None),
        };
        let (status, mut status_tick) = match status {
            Some((writer, every)) => (Some(writer), Some(ticker(every))),
            None => (None, None),
        };
        refresh_status(status.as_ref(), &orchestrator);

        let mut runs: JoinSet<Result<RunOutcome>> = JoinSet::new();
        info!("Runtime loop started");

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                info!("Shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            info!("Shutdown channel closed");
                            break;
                        }
                    }
                }
                Some(trigger) = triggers.recv() => {
                    orchestrator.dispatch_trigger(trigger, &mut runs);
                }
                Some(event) = next_upstream(&mut upstream_events) => {
                    let transition = !matches!(event, UpstreamEvent::Candles { .. });
                    orchestrator.dispatch_upstream(event, &mut runs);
                    if transition {
                        refresh_status(status.as_ref(), &orchestrator);
                    }
                }
                () = tick(&mut watchdog_tick) => {
                    if let Some(watchdog) = &watchdog {
                        watchdog.dispatch(&mut runs);
                    }
                }
                () = tick(&mut status_tick) => {
                    refresh_status(status.as_ref(), &orchestrator);
                }
                Some(finished) = runs.join_next() => {
                    log_run(finished);
                    refresh_status(status.as_ref(), &orchestrator);
                }
            }
        }

        orchestrator.shutdown();
        runs.shutdown().await;
        refresh_status(status.as_ref(), &orchestrator);
        info!("Runtime stopped");
        Ok(())
    }
}

/// Build the application from `config` and run it until `shutdown`.
#[allow(clippy::result_large_err)]
pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    info!(
        paper = config.paper,
        timeframes = ?config.models.keys().collect::<Vec<_>>(),
        "Starting cadence"
    );
    let app = super::bootstrap::build_application(&config)?;
    app.run(shutdown).await
}

fn ticker(every: Duration) -> Interval {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn next_upstream(
    events: &mut Option<mpsc::UnboundedReceiver<UpstreamEvent>>,
) -> Option<UpstreamEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

fn refresh_status(writer: Option<&StatusWriter>, orchestrator: &Orchestrator) {
    let Some(writer) = writer else {
        return;
    };
    writer.update(&orchestrator.status(), orchestrator.counts());
    if let Err(e) = writer.write() {
        warn!(path = %writer.path().display(), error = %e, "Failed to write status file");
    }
}

fn log_run(finished: std::result::Result<Result<RunOutcome>, JoinError>) {
    match finished {
        Ok(Ok(outcome)) => debug!(outcome = ?outcome, "Run finished"),
        Ok(Err(e)) => warn!(error = %e, "Run failed"),
        Err(e) if e.is_cancelled() => debug!("Run cancelled"),
        Err(e) => warn!(error = %e, "Run task panicked"),
    }
}
