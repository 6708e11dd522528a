//! Outbound adapters (driven side).

pub mod market;
pub mod notifier;
pub mod oracle;
pub mod report;
pub mod runner;
pub mod sink;
pub mod state;
pub mod upstream;
