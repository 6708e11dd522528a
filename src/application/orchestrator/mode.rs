//! Mode transitions and upstream event handling.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use super::{merge_max, Orchestrator};
use crate::domain::{Mode, RunOutcome, RunSource};
use crate::error::Result;
use crate::port::outbound::notifier::Event;
use crate::port::outbound::upstream::UpstreamEvent;

impl Orchestrator {
    /// Switch to paper mode and stop the scheduler. Idempotent.
    pub fn enter_paper(&self) {
        {
            let mut state = self.state.write();
            if state.mode == Mode::Paper {
                return;
            }
            state.mode = Mode::Paper;
        }
        self.scheduler.stop();
        info!("Switched to paper mode");
        self.services
            .notifiers
            .notify_all(Event::ModeChanged { mode: Mode::Paper });
    }

    /// Switch to live mode, reseeding the scheduler from durable state.
    /// Idempotent.
    pub fn enter_live(&self) {
        if self.mode() == Mode::Live {
            return;
        }
        let durable = self.load_live();
        let seed = {
            let mut state = self.state.write();
            if state.mode == Mode::Live {
                return;
            }
            state.mode = Mode::Live;
            merge_max(&mut state.last_run, &durable);
            state.last_run.clone()
        };
        if !self.shut_down.load(std::sync::atomic::Ordering::SeqCst) {
            self.scheduler.start(&seed);
        }
        info!(seeded = seed.len(), "Switched to live mode");
        self.services
            .notifiers
            .notify_all(Event::ModeChanged { mode: Mode::Live });
    }

    /// Apply an upstream event. Candle batches run the paper model and
    /// return its outcome; every other event returns `None`.
    pub async fn handle_upstream(&self, event: UpstreamEvent) -> Result<Option<RunOutcome>> {
        match event {
            UpstreamEvent::Candles {
                timeframe,
                boundary,
                candles,
            } => {
                if self.mode() != Mode::Paper {
                    debug!(timeframe = %timeframe, boundary, "Candles dropped in live mode");
                    return Ok(Some(RunOutcome::Dropped));
                }
                self.run_model(timeframe, boundary, candles, RunSource::Paper)
                    .await
                    .map(Some)
            }
            other => {
                self.apply_signal(other);
                Ok(None)
            }
        }
    }

    /// Apply an upstream event, spawning candle runs onto `runs` after a
    /// synchronous mode check so ordering with transitions is preserved.
    pub fn dispatch_upstream(
        self: &Arc<Self>,
        event: UpstreamEvent,
        runs: &mut JoinSet<Result<RunOutcome>>,
    ) -> bool {
        match event {
            UpstreamEvent::Candles {
                timeframe,
                boundary,
                candles,
            } => {
                if self.mode() != Mode::Paper {
                    debug!(timeframe = %timeframe, boundary, "Candles dropped in live mode");
                    return false;
                }
                let this = Arc::clone(self);
                runs.spawn(async move {
                    this.run_model(timeframe, boundary, candles, RunSource::Paper)
                        .await
                });
                true
            }
            other => {
                self.apply_signal(other);
                false
            }
        }
    }

    fn apply_signal(&self, event: UpstreamEvent) {
        let notifiers = &self.services.notifiers;
        match event {
            UpstreamEvent::Candles { .. } => {}
            UpstreamEvent::PaperOn => self.enter_paper(),
            UpstreamEvent::PaperOff => self.enter_live(),
            UpstreamEvent::LoopReset => self.reset_paper_loop(),
            UpstreamEvent::Connected => info!("Upstream link established"),
            UpstreamEvent::Disconnected { reason } => {
                notifiers.notify_all(Event::UpstreamDisconnected { reason });
            }
            UpstreamEvent::UpstreamStartup => {
                info!("Upstream announced startup");
                notifiers.notify_all(Event::UpstreamStatus { running: true });
            }
            UpstreamEvent::UpstreamShutdown => {
                info!("Upstream announced shutdown");
                notifiers.notify_all(Event::UpstreamStatus { running: false });
            }
        }
    }

    fn reset_paper_loop(&self) {
        if self.mode() != Mode::Paper {
            debug!("Loop reset ignored in live mode");
            return;
        }
        let purged = self.services.sink.purge(RunSource::Paper);
        self.state.write().paper_last_run.clear();
        info!(purged, "Paper loop reset");
        self.services.notifiers.notify_all(Event::LoopReset);
    }
}
