//! Run protocol: execute, acknowledge, then commit.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{Orchestrator, RunKey};
use crate::application::scheduler::Trigger;
use crate::domain::{
    build_input, Candle, Mode, ModelConfig, RunEnvelope, RunOutcome, RunSource, Timeframe,
};
use crate::error::Result;
use crate::port::outbound::notifier::run_completed;
use crate::port::outbound::report::{FailureStage, RunFailure};
use crate::port::outbound::sink::RunRecord;

/// Removes its key from the in-flight set when dropped, including when the
/// owning task is aborted.
pub(super) struct InFlight<'a> {
    owner: &'a Orchestrator,
    key: RunKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.owner.in_flight.lock().remove(&self.key);
    }
}

impl Orchestrator {
    pub(super) fn claim(&self, key: RunKey) -> Option<InFlight<'_>> {
        if self.in_flight.lock().insert(key) {
            Some(InFlight { owner: self, key })
        } else {
            None
        }
    }

    /// Run one computation pass over `candles` and commit it if the
    /// authority acknowledges.
    ///
    /// Runner failures are reported and returned as errors; an unconfirmed
    /// run is reported and returned as [`RunOutcome::Unacknowledged`]. In
    /// neither case is anything persisted.
    pub async fn run_model(
        &self,
        timeframe: Timeframe,
        boundary: i64,
        candles: Vec<Candle>,
        source: RunSource,
    ) -> Result<RunOutcome> {
        let Some(_guard) = self.claim((timeframe, boundary, source)) else {
            debug!(timeframe = %timeframe, boundary, source = %source, "Run already in flight");
            return Ok(RunOutcome::AlreadyRunning);
        };
        let config = self.configs.snapshot(timeframe)?;
        self.execute(timeframe, boundary, candles, source, config).await
    }

    /// Fetch `lookback` candles ending at `boundary` and run the live model.
    pub(super) async fn run_live(&self, timeframe: Timeframe, boundary: i64) -> Result<RunOutcome> {
        let source = RunSource::Live;
        let Some(_guard) = self.claim((timeframe, boundary, source)) else {
            debug!(timeframe = %timeframe, boundary, "Live run already in flight");
            return Ok(RunOutcome::AlreadyRunning);
        };

        let config = self.configs.snapshot(timeframe)?;
        let candles = match self
            .services
            .candles
            .candles(timeframe, boundary, config.lookback)
            .await
        {
            Ok(candles) => candles,
            Err(e) => {
                self.stats.failed();
                self.report(timeframe, boundary, source, FailureStage::Candles, &e);
                return Err(e);
            }
        };

        self.execute(timeframe, boundary, candles, source, config).await
    }

    /// Handle a scheduler trigger. Dropped unless in live mode.
    pub async fn handle_trigger(&self, trigger: Trigger) -> Result<RunOutcome> {
        if self.mode() != Mode::Live {
            debug!(timeframe = %trigger.timeframe, boundary = trigger.boundary, "Trigger dropped in paper mode");
            return Ok(RunOutcome::Dropped);
        }
        if self
            .last_run(trigger.timeframe, RunSource::Live)
            .is_some_and(|last| last >= trigger.boundary)
        {
            debug!(timeframe = %trigger.timeframe, boundary = trigger.boundary, "Boundary already committed");
            return Ok(RunOutcome::AlreadyCommitted);
        }
        self.run_live(trigger.timeframe, trigger.boundary).await
    }

    /// Check the mode now and, if the trigger is honored, spawn its run
    /// onto `runs`. Returns whether a run was spawned.
    pub fn dispatch_trigger(
        self: &Arc<Self>,
        trigger: Trigger,
        runs: &mut JoinSet<Result<RunOutcome>>,
    ) -> bool {
        if self.mode() != Mode::Live {
            debug!(timeframe = %trigger.timeframe, boundary = trigger.boundary, "Trigger dropped in paper mode");
            return false;
        }
        let this = Arc::clone(self);
        runs.spawn(async move { this.handle_trigger(trigger).await });
        true
    }

    async fn execute(
        &self,
        timeframe: Timeframe,
        boundary: i64,
        candles: Vec<Candle>,
        source: RunSource,
        config: ModelConfig,
    ) -> Result<RunOutcome> {
        if candles.is_empty() {
            self.stats.skipped();
            debug!(timeframe = %timeframe, boundary, source = %source, "No candles, skipping run");
            return Ok(RunOutcome::Skipped);
        }

        self.stats.attempted();
        let input = build_input(&candles, &config);

        let result = match self.services.runner.execute(&input).await {
            Ok(result) => result,
            Err(e) => {
                self.stats.failed();
                self.report(timeframe, boundary, source, FailureStage::Runner, &e);
                return Err(e.into());
            }
        };
        debug!(
            timeframe = %timeframe,
            boundary,
            run_id = result.output.run_id,
            duration_ms = result.duration_ms,
            "Runner completed"
        );

        let mut output = result.output;
        output.raw_signal = input.signal;
        let envelope = RunEnvelope::new(timeframe, boundary, source, config, output);

        match self.services.acknowledger.acknowledge(&envelope).await {
            Ok(ack) => {
                self.commit(&envelope, ack.id);
                self.stats.committed();
                self.services
                    .notifiers
                    .notify_all(run_completed(envelope, Some(ack.id)));
                Ok(RunOutcome::Committed {
                    authority_id: ack.id,
                })
            }
            Err(e) => {
                self.stats.unacknowledged();
                self.report(timeframe, boundary, source, FailureStage::Acknowledge, &e);
                self.services.notifiers.notify_all(run_completed(envelope, None));
                Ok(RunOutcome::Unacknowledged {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Advance in-memory last-run, persist live state and record the run.
    fn commit(&self, envelope: &RunEnvelope, authority_id: i64) {
        let timeframe = envelope.timeframe;
        let boundary = envelope.boundary;
        let source = envelope.source;

        {
            let mut state = self.state.write();
            let entry = state.runs_mut(source).entry(timeframe).or_insert(boundary);
            if boundary > *entry {
                *entry = boundary;
            }
        }

        if source == RunSource::Live {
            let _persist = self.persist.lock();
            let snapshot = self.state.read().last_run.clone();
            if let Err(e) = self.services.store.save(RunSource::Live, &snapshot) {
                warn!(
                    timeframe = %timeframe,
                    boundary,
                    error = %e,
                    "Failed to persist last-run state; keeping in-memory value"
                );
            }
        }

        self.services.sink.record(RunRecord {
            envelope: envelope.clone(),
            authority_id,
            recorded_at: Utc::now(),
        });
        info!(
            timeframe = %timeframe,
            boundary,
            source = %source,
            authority_id,
            "Boundary committed"
        );
    }

    fn report(
        &self,
        timeframe: Timeframe,
        boundary: i64,
        source: RunSource,
        stage: FailureStage,
        error: &dyn std::fmt::Display,
    ) {
        self.services.reporter.report(&RunFailure {
            timeframe,
            boundary,
            source,
            stage,
            message: error.to_string(),
        });
    }
}
