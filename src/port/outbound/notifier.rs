//! Notifier port for broadcasting run and mode events.
//!
//! Delivery is best-effort: notifiers must not block the caller and no
//! acknowledgment is expected from subscribers.

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Mode, RunEnvelope};

/// Events fanned out to subscribers. Serialized as tagged payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A run finished computing. `authority_id` is `None` when the
    /// acknowledging authority did not confirm it.
    RunCompleted(RunCompletedEvent),
    /// Operating mode changed.
    ModeChanged {
        /// The mode now in effect.
        mode: Mode,
    },
    /// Upstream connection dropped; a reconnect is pending.
    UpstreamDisconnected {
        /// Why the connection ended.
        reason: String,
    },
    /// Upstream announced it started or is shutting down.
    UpstreamStatus {
        /// True on startup, false on shutdown.
        running: bool,
    },
    /// Paper results were purged ahead of a replay loop.
    LoopReset,
}

/// Payload of [`Event::RunCompleted`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunCompletedEvent {
    pub envelope: RunEnvelope,
    pub authority_id: Option<i64>,
}

impl RunCompletedEvent {
    #[must_use]
    pub fn acknowledged(&self) -> bool {
        self.authority_id.is_some()
    }
}

/// Trait for notification handlers.
///
/// Implementations must be thread-safe and return quickly; slow work
/// should be spawned.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);

    /// Release any subscriber-facing resources. Called once at shutdown.
    fn close(&self) {}
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, event: Event) {
        (**self).notify(event);
    }

    fn close(&self) {
        (**self).close();
    }
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Close every registered notifier.
    pub fn close_all(&self) {
        for notifier in &self.notifiers {
            notifier.close();
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::RunCompleted(e) => {
                if let Some(id) = e.authority_id {
                    info!(
                        timeframe = %e.envelope.timeframe,
                        boundary = e.envelope.boundary,
                        source = %e.envelope.source,
                        run_id = e.envelope.run_id,
                        authority_id = id,
                        "Run committed"
                    );
                } else {
                    warn!(
                        timeframe = %e.envelope.timeframe,
                        boundary = e.envelope.boundary,
                        source = %e.envelope.source,
                        run_id = e.envelope.run_id,
                        "Run completed without acknowledgment"
                    );
                }
            }
            Event::ModeChanged { mode } => {
                info!(mode = %mode, "Mode changed");
            }
            Event::UpstreamDisconnected { reason } => {
                warn!(reason = %reason, "Upstream disconnected");
            }
            Event::UpstreamStatus { running } => {
                info!(running, "Upstream status");
            }
            Event::LoopReset => {
                info!("Paper loop reset");
            }
        }
    }
}

/// Helper for building the run-completed event.
#[must_use]
pub fn run_completed(envelope: RunEnvelope, authority_id: Option<i64>) -> Event {
    Event::RunCompleted(RunCompletedEvent {
        envelope,
        authority_id,
    })
}
