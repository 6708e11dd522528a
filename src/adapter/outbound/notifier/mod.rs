//! Notifier adapters.

mod broadcast;

pub use broadcast::BroadcastNotifier;
