//! Recording doubles for notifications, failure reports and upstream health.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::port::outbound::notifier::{Event, Notifier, RunCompletedEvent};
use crate::port::outbound::report::{FailureReporter, RunFailure};
use crate::port::outbound::upstream::UpstreamLink;

/// Thread-safe event collector for notification assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
    closed: Arc<AtomicUsize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn run_completions(&self) -> Vec<RunCompletedEvent> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::RunCompleted(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Collects reported failures.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    failures: Arc<Mutex<Vec<RunFailure>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<RunFailure> {
        self.failures.lock().clone()
    }
}

impl FailureReporter for RecordingReporter {
    fn report(&self, failure: &RunFailure) {
        self.failures.lock().push(failure.clone());
    }
}

/// Upstream link with a settable health flag that counts closes.
#[derive(Clone, Default)]
pub struct FakeUpstreamLink {
    connected: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
}

impl FakeUpstreamLink {
    pub fn new(connected: bool) -> Self {
        let link = Self::default();
        link.connected.store(connected, Ordering::SeqCst);
        link
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl UpstreamLink for FakeUpstreamLink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
