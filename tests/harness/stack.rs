//! Orchestrator wired to real adapters where a test wants them.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cadence::adapter::outbound::runner::ProcessRunner;
use cadence::adapter::outbound::sink::MemoryResultSink;
use cadence::adapter::outbound::state::JsonFileLastRunStore;
use cadence::application::{BoundaryScheduler, Collaborators, ModelConfigStore, Orchestrator, Trigger};
use cadence::domain::Timeframe;
use cadence::port::outbound::notifier::NotifierRegistry;
use cadence::port::outbound::oracle::Acknowledger;
use cadence::port::outbound::runner::ModelRunner;
use cadence::testkit::clock::ManualClock;
use cadence::testkit::domain::{candles_from_closes, model_config};
use cadence::testkit::notifier::{RecordingNotifier, RecordingReporter};
use cadence::testkit::oracle::ScriptedAcknowledger;
use cadence::testkit::runner::ScriptedRunner;
use cadence::testkit::store::StaticCandleSource;
use tokio::sync::mpsc;

pub struct Stack {
    pub orchestrator: Arc<Orchestrator>,
    pub triggers: mpsc::UnboundedReceiver<Trigger>,
    pub clock: ManualClock,
    pub sink: Arc<MemoryResultSink>,
    pub candles: StaticCandleSource,
    pub notifier: RecordingNotifier,
    pub reporter: RecordingReporter,
}

/// Builder for [`Stack`] with a file-backed last-run store in `state_dir`.
pub struct StackBuilder {
    timeframes: Vec<Timeframe>,
    now_ms: i64,
    runner: Arc<dyn ModelRunner>,
    acknowledger: Arc<dyn Acknowledger>,
}

impl StackBuilder {
    pub fn new(now_ms: i64) -> Self {
        Self {
            timeframes: vec![Timeframe::H4],
            now_ms,
            runner: Arc::new(ScriptedRunner::new()),
            acknowledger: Arc::new(ScriptedAcknowledger::new()),
        }
    }

    pub fn timeframes(mut self, timeframes: &[Timeframe]) -> Self {
        self.timeframes = timeframes.to_vec();
        self
    }

    pub fn runner(mut self, runner: impl ModelRunner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    pub fn acknowledger(mut self, acknowledger: impl Acknowledger + 'static) -> Self {
        self.acknowledger = Arc::new(acknowledger);
        self
    }

    pub fn build(self, state_dir: &Path) -> Stack {
        let clock = ManualClock::new(self.now_ms);
        let sink = Arc::new(MemoryResultSink::new(50));
        let candles = StaticCandleSource::new(candles_from_closes(0, &[1.0, 2.0, 3.0, 4.0]));
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();

        let mut notifiers = NotifierRegistry::new();
        notifiers.register(Box::new(notifier.clone()));

        let configs: BTreeMap<_, _> = self
            .timeframes
            .iter()
            .map(|tf| (*tf, model_config("macd")))
            .collect();
        let (scheduler, triggers) = BoundaryScheduler::new(
            self.timeframes.clone(),
            Duration::from_millis(10),
            Arc::new(clock.clone()),
        );

        let orchestrator = Orchestrator::new(
            ModelConfigStore::new(configs),
            scheduler,
            Collaborators {
                runner: self.runner,
                acknowledger: self.acknowledger,
                store: Arc::new(JsonFileLastRunStore::new(state_dir)),
                sink: sink.clone(),
                candles: Arc::new(candles.clone()),
                reporter: Arc::new(reporter.clone()),
                notifiers,
                upstream: None,
                clock: Arc::new(clock.clone()),
            },
        );

        Stack {
            orchestrator: Arc::new(orchestrator),
            triggers,
            clock,
            sink,
            candles,
            notifier,
            reporter,
        }
    }
}

/// `sh -c` runner that drains stdin and prints `stdout`.
#[cfg(unix)]
pub fn echo_runner(stdout: &str) -> ProcessRunner {
    ProcessRunner::new("sh").with_args(vec![
        "-c".to_string(),
        format!("cat > /dev/null; echo '{stdout}'"),
    ])
}
