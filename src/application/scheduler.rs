//! Wall-clock boundary scheduler.
//!
//! Polls the clock on a short fixed interval and emits exactly one
//! [`Trigger`] per tracked timeframe per boundary. Boundaries that elapsed
//! while the scheduler was stopped are not replayed individually: only the
//! current boundary fires, and the gap is logged.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::Timeframe;
use crate::port::outbound::clock::Clock;

/// A timeframe crossed into a new boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Trigger {
    pub timeframe: Timeframe,
    pub boundary: i64,
}

struct Detector {
    timeframes: Vec<Timeframe>,
    clock: Arc<dyn Clock>,
    last_fired: Mutex<HashMap<Timeframe, i64>>,
    triggers: mpsc::UnboundedSender<Trigger>,
}

impl Detector {
    fn check(&self) -> Vec<Trigger> {
        let now = self.clock.now_ms();
        let mut last_fired = self.last_fired.lock();
        let mut fired = Vec::new();

        for &timeframe in &self.timeframes {
            let boundary = timeframe.boundary(now);
            if let Some(&previous) = last_fired.get(&timeframe) {
                if boundary <= previous {
                    continue;
                }
                let skipped = timeframe.intervals_between(previous, boundary) - 1;
                if skipped > 0 {
                    warn!(
                        timeframe = %timeframe,
                        previous,
                        boundary,
                        skipped,
                        "Boundaries elapsed without a trigger; firing current only"
                    );
                }
            }

            last_fired.insert(timeframe, boundary);
            let trigger = Trigger {
                timeframe,
                boundary,
            };
            debug!(timeframe = %timeframe, boundary, "Boundary crossed");
            if self.triggers.send(trigger).is_err() {
                debug!("Trigger receiver dropped");
            }
            fired.push(trigger);
        }

        fired
    }
}

/// Timer-driven detector of boundary crossings.
pub struct BoundaryScheduler {
    detector: Arc<Detector>,
    poll_interval: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BoundaryScheduler {
    /// Create a scheduler and the receiving end of its trigger channel.
    pub fn new(
        timeframes: Vec<Timeframe>,
        poll_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::UnboundedReceiver<Trigger>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            detector: Arc::new(Detector {
                timeframes,
                clock,
                last_fired: Mutex::new(HashMap::new()),
                triggers: tx,
            }),
            poll_interval,
            task: Mutex::new(None),
        };
        (scheduler, rx)
    }

    /// Seed last-fired state, run one check immediately, then start polling.
    ///
    /// Restarts the polling task if it was already running. Seeds for
    /// untracked timeframes are ignored. Must be called inside a tokio
    /// runtime.
    pub fn start(&self, initial: &HashMap<Timeframe, i64>) -> Vec<Trigger> {
        self.stop();

        {
            let mut last_fired = self.detector.last_fired.lock();
            last_fired.clear();
            for timeframe in &self.detector.timeframes {
                if let Some(&boundary) = initial.get(timeframe) {
                    last_fired.insert(*timeframe, boundary);
                }
            }
        }

        let fired = self.detector.check();

        let detector = Arc::clone(&self.detector);
        let period = self.poll_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                detector.check();
            }
        });
        *self.task.lock() = Some(handle);

        info!(
            timeframes = ?self.detector.timeframes,
            poll_ms = period.as_millis() as u64,
            immediate = fired.len(),
            "Boundary scheduler started"
        );
        fired
    }

    /// Stop periodic checks. Idempotent.
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
            info!("Boundary scheduler stopped");
        }
    }

    /// Run one check now and return the triggers it emitted.
    pub fn check(&self) -> Vec<Trigger> {
        self.detector.check()
    }

    /// Advance last-fired out of band. Never moves it backwards.
    pub fn mark_fired(&self, timeframe: Timeframe, boundary: i64) {
        let mut last_fired = self.detector.last_fired.lock();
        let entry = last_fired.entry(timeframe).or_insert(boundary);
        if boundary > *entry {
            *entry = boundary;
        }
    }

    #[must_use]
    pub fn last_fired(&self, timeframe: Timeframe) -> Option<i64> {
        self.detector.last_fired.lock().get(&timeframe).copied()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    #[must_use]
    pub fn timeframes(&self) -> &[Timeframe] {
        &self.detector.timeframes
    }
}

impl Drop for BoundaryScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::clock::ManualClock;

    const H4: i64 = 14_400_000;

    fn scheduler(
        timeframes: Vec<Timeframe>,
        clock: &ManualClock,
    ) -> (BoundaryScheduler, mpsc::UnboundedReceiver<Trigger>) {
        BoundaryScheduler::new(
            timeframes,
            Duration::from_millis(10),
            Arc::new(clock.clone()),
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Trigger>) -> Vec<Trigger> {
        let mut out = Vec::new();
        while let Ok(t) = rx.try_recv() {
            out.push(t);
        }
        out
    }

    #[tokio::test]
    async fn fires_current_boundary_once() {
        let clock = ManualClock::new(H4 * 5);
        let (scheduler, mut rx) = scheduler(vec![Timeframe::H4], &clock);

        let fired = scheduler.start(&HashMap::new());
        assert_eq!(
            fired,
            vec![Trigger {
                timeframe: Timeframe::H4,
                boundary: H4 * 5
            }]
        );
        assert!(scheduler.check().is_empty());
        assert_eq!(drain(&mut rx).len(), 1);
        scheduler.stop();
    }

    #[tokio::test]
    async fn seeded_boundary_is_not_refired() {
        let clock = ManualClock::new(H4 * 5 + 1_000);
        let (scheduler, mut rx) = scheduler(vec![Timeframe::H4], &clock);

        let seed = HashMap::from([(Timeframe::H4, H4 * 5)]);
        assert!(scheduler.start(&seed).is_empty());

        clock.set(H4 * 6);
        let fired = scheduler.check();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].boundary, H4 * 6);
        assert_eq!(drain(&mut rx).len(), 1);
        scheduler.stop();
    }

    #[tokio::test]
    async fn gap_fires_only_current_boundary() {
        let clock = ManualClock::new(H4 * 10);
        let (scheduler, _rx) = scheduler(vec![Timeframe::H4], &clock);

        let seed = HashMap::from([(Timeframe::H4, H4 * 5)]);
        let fired = scheduler.start(&seed);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].boundary, H4 * 10);
        scheduler.stop();
    }

    #[tokio::test]
    async fn mark_fired_suppresses_and_never_regresses() {
        let clock = ManualClock::new(H4 * 5);
        let (scheduler, _rx) = scheduler(vec![Timeframe::H4], &clock);
        scheduler.start(&HashMap::new());

        clock.set(H4 * 6);
        scheduler.mark_fired(Timeframe::H4, H4 * 6);
        assert!(scheduler.check().is_empty());

        scheduler.mark_fired(Timeframe::H4, H4 * 2);
        assert_eq!(scheduler.last_fired(Timeframe::H4), Some(H4 * 6));
        scheduler.stop();
    }

    #[tokio::test]
    async fn untracked_seed_entries_are_ignored() {
        let clock = ManualClock::new(H4 * 5);
        let (scheduler, _rx) = scheduler(vec![Timeframe::H4], &clock);
        let seed = HashMap::from([(Timeframe::D1, 42)]);
        scheduler.start(&seed);
        assert_eq!(scheduler.last_fired(Timeframe::D1), None);
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_check_emits_new_boundaries_in_order() {
        let clock = ManualClock::new(0);
        let (scheduler, mut rx) = scheduler(vec![Timeframe::M15, Timeframe::H1], &clock);
        scheduler.start(&HashMap::new());
        assert_eq!(drain(&mut rx).len(), 2);

        let m15 = Timeframe::M15.interval_ms();
        let mut seen = Vec::new();
        for step in 1..=4 {
            clock.set(m15 * step);
            tokio::time::sleep(Duration::from_millis(15)).await;
            seen.extend(drain(&mut rx));
        }

        let m15_boundaries: Vec<_> = seen
            .iter()
            .filter(|t| t.timeframe == Timeframe::M15)
            .map(|t| t.boundary)
            .collect();
        assert_eq!(m15_boundaries, vec![m15, m15 * 2, m15 * 3, m15 * 4]);

        let h1: Vec<_> = seen
            .iter()
            .filter(|t| t.timeframe == Timeframe::H1)
            .collect();
        assert_eq!(h1.len(), 1);
        assert_eq!(h1[0].boundary, Timeframe::H1.interval_ms());
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_periodic_checks_and_is_idempotent() {
        let clock = ManualClock::new(0);
        let (scheduler, mut rx) = scheduler(vec![Timeframe::M15], &clock);
        scheduler.start(&HashMap::new());
        drain(&mut rx);
        assert!(scheduler.is_running());

        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());

        clock.set(Timeframe::M15.interval_ms());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(drain(&mut rx).is_empty());
    }
}
