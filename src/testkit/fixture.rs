//! Fully wired orchestrator over in-memory doubles.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::clock::ManualClock;
use super::domain::{candles_from_closes, model_config};
use super::notifier::{FakeUpstreamLink, RecordingNotifier, RecordingReporter};
use super::oracle::ScriptedAcknowledger;
use super::runner::ScriptedRunner;
use super::store::{MemoryLastRunStore, StaticCandleSource};
use crate::adapter::outbound::sink::MemoryResultSink;
use crate::application::{BoundaryScheduler, Collaborators, ModelConfigStore, Orchestrator, Trigger};
use crate::domain::Timeframe;
use crate::port::outbound::notifier::NotifierRegistry;

/// `4h` interval in milliseconds.
pub const H4: i64 = 14_400_000;

/// Orchestrator plus handles to every double it was built with.
pub struct OrchestratorFixture {
    pub orchestrator: Arc<Orchestrator>,
    pub triggers: mpsc::UnboundedReceiver<Trigger>,
    pub clock: ManualClock,
    pub runner: ScriptedRunner,
    pub acknowledger: ScriptedAcknowledger,
    pub store: MemoryLastRunStore,
    pub sink: Arc<MemoryResultSink>,
    pub candles: StaticCandleSource,
    pub reporter: RecordingReporter,
    pub notifier: RecordingNotifier,
    pub upstream: FakeUpstreamLink,
}

impl OrchestratorFixture {
    /// Tracks `4h` only, clock at `H4 * 5 + 1s`, empty durable state.
    pub fn new() -> Self {
        Self::with_store(&[Timeframe::H4], MemoryLastRunStore::new())
    }

    pub fn with_store(timeframes: &[Timeframe], store: MemoryLastRunStore) -> Self {
        let clock = ManualClock::new(H4 * 5 + 1_000);
        let runner = ScriptedRunner::new();
        let acknowledger = ScriptedAcknowledger::new();
        let sink = Arc::new(MemoryResultSink::new(100));
        let candles = StaticCandleSource::new(candles_from_closes(0, &[1.0, 2.0, 3.0]));
        let reporter = RecordingReporter::new();
        let notifier = RecordingNotifier::new();
        let upstream = FakeUpstreamLink::new(true);

        let mut notifiers = NotifierRegistry::new();
        notifiers.register(Box::new(notifier.clone()));

        let configs: BTreeMap<_, _> = timeframes
            .iter()
            .map(|tf| (*tf, model_config("macd")))
            .collect();
        let (scheduler, triggers) = BoundaryScheduler::new(
            timeframes.to_vec(),
            Duration::from_millis(10),
            Arc::new(clock.clone()),
        );

        let orchestrator = Orchestrator::new(
            ModelConfigStore::new(configs),
            scheduler,
            Collaborators {
                runner: Arc::new(runner.clone()),
                acknowledger: Arc::new(acknowledger.clone()),
                store: Arc::new(store.clone()),
                sink: sink.clone(),
                candles: Arc::new(candles.clone()),
                reporter: Arc::new(reporter.clone()),
                notifiers,
                upstream: Some(Arc::new(upstream.clone())),
                clock: Arc::new(clock.clone()),
            },
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            triggers,
            clock,
            runner,
            acknowledger,
            store,
            sink,
            candles,
            reporter,
            notifier,
            upstream,
        }
    }

    /// Triggers emitted so far.
    pub fn drain_triggers(&mut self) -> Vec<Trigger> {
        let mut out = Vec::new();
        while let Ok(trigger) = self.triggers.try_recv() {
            out.push(trigger);
        }
        out
    }
}

impl Default for OrchestratorFixture {
    fn default() -> Self {
        Self::new()
    }
}
