//! Dual-mode run orchestration.
//!
//! The orchestrator owns the mode state machine (`live` / `paper`), turns
//! scheduler triggers and upstream candle batches into model runs, and
//! applies the acknowledgment-gated commit protocol:
//!
//! ```text
//! trigger / candles ─▶ runner ─▶ acknowledger ─┬─ ack ──▶ last-run + store + sink ─▶ broadcast(id)
//!                                               └─ none ─▶ report ───────────────────▶ broadcast(None)
//! ```
//!
//! A boundary is durably recorded only after the authority acknowledged it,
//! so a crash or a flaky authority means the boundary is retried, never lost.

mod control;
mod mode;
mod protocol;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use super::config_store::ModelConfigStore;
use super::scheduler::BoundaryScheduler;
use super::stats::{RunCounts, RunStats};
use crate::domain::{Mode, RunSource, Timeframe};
use crate::port::outbound::clock::Clock;
use crate::port::outbound::market::CandleSource;
use crate::port::outbound::notifier::NotifierRegistry;
use crate::port::outbound::oracle::Acknowledger;
use crate::port::outbound::report::FailureReporter;
use crate::port::outbound::runner::ModelRunner;
use crate::port::outbound::sink::ResultSink;
use crate::port::outbound::state::{LastRunStore, LastRuns};
use crate::port::outbound::upstream::UpstreamLink;

/// External collaborators of the run protocol.
pub struct Collaborators {
    pub runner: Arc<dyn ModelRunner>,
    pub acknowledger: Arc<dyn Acknowledger>,
    pub store: Arc<dyn LastRunStore>,
    pub sink: Arc<dyn ResultSink>,
    pub candles: Arc<dyn CandleSource>,
    pub reporter: Arc<dyn FailureReporter>,
    pub notifiers: NotifierRegistry,
    pub upstream: Option<Arc<dyn UpstreamLink>>,
    pub clock: Arc<dyn Clock>,
}

/// Identity of a run: at most one attempt per key executes at a time.
type RunKey = (Timeframe, i64, RunSource);

#[derive(Debug, Default)]
struct State {
    mode: Mode,
    last_run: LastRuns,
    paper_last_run: LastRuns,
}

impl State {
    fn runs_mut(&mut self, source: RunSource) -> &mut LastRuns {
        match source {
            RunSource::Live => &mut self.last_run,
            RunSource::Paper => &mut self.paper_last_run,
        }
    }

    fn runs(&self, source: RunSource) -> &LastRuns {
        match source {
            RunSource::Live => &self.last_run,
            RunSource::Paper => &self.paper_last_run,
        }
    }
}

pub struct Orchestrator {
    state: RwLock<State>,
    configs: ModelConfigStore,
    scheduler: BoundaryScheduler,
    services: Collaborators,
    in_flight: Mutex<HashSet<RunKey>>,
    /// Serializes durable writes so a stale snapshot never lands last.
    persist: Mutex<()>,
    stats: RunStats,
    shut_down: AtomicBool,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        configs: ModelConfigStore,
        scheduler: BoundaryScheduler,
        services: Collaborators,
    ) -> Self {
        Self {
            state: RwLock::new(State::default()),
            configs,
            scheduler,
            services,
            in_flight: Mutex::new(HashSet::new()),
            persist: Mutex::new(()),
            stats: RunStats::default(),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Load durable live state, seed memory and, in live mode, start the
    /// scheduler. A failed load starts from an empty seed.
    pub fn start(&self) {
        let seed = self.load_live();
        let mode = {
            let mut state = self.state.write();
            merge_max(&mut state.last_run, &seed);
            state.mode
        };
        info!(
            mode = %mode,
            timeframes = ?self.configs.timeframes(),
            seeded = seed.len(),
            "Orchestrator started"
        );
        if mode == Mode::Live {
            let seed = self.state.read().last_run.clone();
            self.scheduler.start(&seed);
        }
    }

    /// Stop the scheduler, close the upstream link and the broadcast
    /// channel. Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.scheduler.stop();
        if let Some(upstream) = &self.services.upstream {
            upstream.close();
        }
        self.services.notifiers.close_all();
        info!("Orchestrator shut down");
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.state.read().mode
    }

    #[must_use]
    pub fn last_run(&self, timeframe: Timeframe, source: RunSource) -> Option<i64> {
        self.state.read().runs(source).get(&timeframe).copied()
    }

    #[must_use]
    pub fn scheduler(&self) -> &BoundaryScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn configs(&self) -> &ModelConfigStore {
        &self.configs
    }

    #[must_use]
    pub fn counts(&self) -> RunCounts {
        self.stats.counts()
    }

    #[must_use]
    pub fn upstream_connected(&self) -> bool {
        self.services
            .upstream
            .as_ref()
            .is_some_and(|link| link.is_connected())
    }

    fn load_live(&self) -> LastRuns {
        match self.services.store.load(RunSource::Live) {
            Ok(runs) => runs,
            Err(e) => {
                warn!(error = %e, "Failed to load durable last-run state");
                LastRuns::new()
            }
        }
    }
}

/// Raise each entry of `into` to at least the value in `from`.
fn merge_max(into: &mut LastRuns, from: &LastRuns) {
    for (&timeframe, &boundary) in from {
        let entry = into.entry(timeframe).or_insert(boundary);
        if boundary > *entry {
            *entry = boundary;
        }
    }
}

fn sorted(runs: &HashMap<Timeframe, i64>) -> std::collections::BTreeMap<Timeframe, i64> {
    runs.iter().map(|(k, v)| (*k, *v)).collect()
}
