//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the external collaborators of the run protocol:
//! the model runner, the acknowledging authority, durable state, the result
//! history, market data, observability and notifications.

pub mod clock;
pub mod market;
pub mod notifier;
pub mod oracle;
pub mod report;
pub mod runner;
pub mod sink;
pub mod state;
pub mod upstream;
