//! Catch-up for boundaries the scheduler fired but nobody committed.
//!
//! A boundary whose run failed or was not acknowledged stays uncommitted.
//! The watchdog periodically finds such timeframes, once the boundary is
//! older than a grace period, and re-runs them through
//! [`ControlPort::trigger_run`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::orchestrator::Orchestrator;
use crate::domain::{Mode, RunOutcome, RunSource, Timeframe};
use crate::error::Result;
use crate::port::inbound::control::ControlPort;
use crate::port::outbound::clock::Clock;

pub struct Watchdog {
    orchestrator: Arc<Orchestrator>,
    clock: Arc<dyn Clock>,
    grace: Duration,
}

impl Watchdog {
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>, clock: Arc<dyn Clock>, grace: Duration) -> Self {
        Self {
            orchestrator,
            clock,
            grace,
        }
    }

    /// Timeframes whose current boundary is past the grace period and not
    /// yet committed. Empty outside live mode.
    #[must_use]
    pub fn lagging(&self) -> Vec<Timeframe> {
        if self.orchestrator.mode() != Mode::Live {
            return Vec::new();
        }
        let now = self.clock.now_ms();
        let grace_ms = self.grace.as_millis() as i64;

        self.orchestrator
            .configs()
            .timeframes()
            .into_iter()
            .filter(|timeframe| {
                let boundary = timeframe.boundary(now);
                now - boundary >= grace_ms
                    && self
                        .orchestrator
                        .last_run(*timeframe, RunSource::Live)
                        .map_or(true, |last| last < boundary)
            })
            .collect()
    }

    /// Spawn a manual run for every lagging timeframe. Returns how many were
    /// spawned.
    pub fn dispatch(&self, runs: &mut JoinSet<Result<RunOutcome>>) -> usize {
        let lagging = self.lagging();
        for &timeframe in &lagging {
            let orchestrator = Arc::clone(&self.orchestrator);
            runs.spawn(async move {
                let receipt = orchestrator.trigger_run(timeframe).await?;
                Ok(receipt.outcome)
            });
        }
        if lagging.is_empty() {
            debug!("Watchdog found nothing to catch up");
        } else {
            info!(timeframes = ?lagging, "Watchdog re-running uncommitted boundaries");
        }
        lagging.len()
    }

    /// Run every lagging timeframe now and wait for the outcomes.
    pub async fn sweep(&self) -> Vec<(Timeframe, Result<RunOutcome>)> {
        let mut outcomes = Vec::new();
        for timeframe in self.lagging() {
            let result = self
                .orchestrator
                .trigger_run(timeframe)
                .await
                .map(|receipt| receipt.outcome);
            if let Err(e) = &result {
                warn!(timeframe = %timeframe, error = %e, "Watchdog run failed");
            }
            outcomes.push((timeframe, result));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::fixture::{OrchestratorFixture, H4};

    fn watchdog(fx: &OrchestratorFixture, grace_ms: u64) -> Watchdog {
        Watchdog::new(
            Arc::clone(&fx.orchestrator),
            Arc::new(fx.clock.clone()),
            Duration::from_millis(grace_ms),
        )
    }

    #[tokio::test]
    async fn uncommitted_boundary_past_grace_is_lagging() {
        let fx = OrchestratorFixture::new();
        assert_eq!(watchdog(&fx, 500).lagging(), vec![Timeframe::H4]);
        assert!(watchdog(&fx, 5_000).lagging().is_empty());
    }

    #[tokio::test]
    async fn sweep_commits_and_clears_lag() {
        let fx = OrchestratorFixture::new();
        fx.acknowledger.push_ack(9);
        let watchdog = watchdog(&fx, 500);

        let outcomes = watchdog.sweep().await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].1.as_ref().unwrap(),
            &RunOutcome::Committed { authority_id: 9 }
        );
        assert_eq!(
            fx.orchestrator.last_run(Timeframe::H4, RunSource::Live),
            Some(H4 * 5)
        );
        assert!(watchdog.lagging().is_empty());
    }

    #[tokio::test]
    async fn failed_catch_up_stays_lagging() {
        let fx = OrchestratorFixture::new();
        fx.acknowledger.push_failure("down");
        let watchdog = watchdog(&fx, 500);

        let outcomes = watchdog.sweep().await;

        assert!(matches!(
            outcomes[0].1.as_ref().unwrap(),
            RunOutcome::Unacknowledged { .. }
        ));
        assert_eq!(watchdog.lagging(), vec![Timeframe::H4]);
    }

    #[tokio::test]
    async fn paper_mode_suspends_catch_up() {
        let fx = OrchestratorFixture::new();
        fx.orchestrator.paper_on();
        let watchdog = watchdog(&fx, 500);

        let mut runs = JoinSet::new();
        assert_eq!(watchdog.dispatch(&mut runs), 0);
        assert!(runs.is_empty());
    }

    #[tokio::test]
    async fn dispatch_spawns_one_run_per_lagging_timeframe() {
        let fx = OrchestratorFixture::new();
        let watchdog = watchdog(&fx, 500);

        let mut runs = JoinSet::new();
        assert_eq!(watchdog.dispatch(&mut runs), 1);
        let outcome = runs.join_next().await.unwrap().unwrap().unwrap();
        assert!(outcome.is_committed());
    }
}
