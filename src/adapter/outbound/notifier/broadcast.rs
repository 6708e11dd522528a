//! Fan-out of events to in-process subscribers.

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::trace;

use crate::port::outbound::notifier::{Event, Notifier};

/// Publishes events on a tokio broadcast channel.
///
/// Lagging subscribers lose the oldest events; having no subscribers is
/// not an error. After [`Notifier::close`] the sender is dropped so every
/// receiver observes the end of the stream.
pub struct BroadcastNotifier {
    sender: Mutex<Option<broadcast::Sender<Event>>>,
}

impl BroadcastNotifier {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Subscribe to future events. Returns `None` once closed.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<Event>> {
        self.sender.lock().as_ref().map(broadcast::Sender::subscribe)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, event: Event) {
        if let Some(sender) = self.sender.lock().as_ref() {
            if sender.send(event).is_err() {
                trace!("No broadcast subscribers");
            }
        }
    }

    fn close(&self) {
        self.sender.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Mode;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let notifier = BroadcastNotifier::new(8);
        let mut a = notifier.subscribe().unwrap();
        let mut b = notifier.subscribe().unwrap();
        assert_eq!(notifier.subscriber_count(), 2);

        notifier.notify(Event::ModeChanged { mode: Mode::Paper });
        assert_eq!(a.recv().await.unwrap(), Event::ModeChanged { mode: Mode::Paper });
        assert_eq!(b.recv().await.unwrap(), Event::ModeChanged { mode: Mode::Paper });
    }

    #[tokio::test]
    async fn no_subscribers_is_fine() {
        let notifier = BroadcastNotifier::new(8);
        notifier.notify(Event::LoopReset);
    }

    #[tokio::test]
    async fn close_ends_streams_and_stops_subscriptions() {
        let notifier = BroadcastNotifier::new(8);
        let mut rx = notifier.subscribe().unwrap();
        notifier.close();
        notifier.close();
        assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
        assert!(notifier.subscribe().is_none());
        notifier.notify(Event::LoopReset);
    }
}
