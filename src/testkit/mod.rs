//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`] - `ManualClock`, a settable [`Clock`](crate::port::outbound::clock::Clock).
//! - [`domain`] - Builders for candles, runner outputs and model configs.
//! - [`fixture`] - `OrchestratorFixture`, an orchestrator wired to the doubles below.
//! - [`runner`] - `ScriptedRunner` model runner double.
//! - [`oracle`] - `ScriptedAcknowledger` authority double.
//! - [`store`] - In-memory last-run store and static candle source.
//! - [`notifier`] - Recording notifier and reporter, fake upstream link.
//! - [`http`] - One-shot HTTP server for client adapters.
//! - [`config`] - Canonical test configurations.

pub mod clock;
pub mod config;
pub mod domain;
pub mod fixture;
pub mod http;
pub mod notifier;
pub mod oracle;
pub mod runner;
pub mod store;
