//! Cadence - boundary-driven model runs with acknowledgment-gated commits.
//!
//! On every candle boundary of each tracked timeframe, cadence pulls recent
//! candles, hands them with the timeframe's model parameters to an external
//! model runner, submits the result to an acknowledging authority and only
//! then advances its durable "last run" marker. A second, paper mode replays
//! candle batches pushed by an upstream service over a socket without
//! touching live state.
//!
//! # Modules
//!
//! - [`domain`] - Timeframes, candles, model parameters, run records
//! - [`port`] - Inbound and outbound trait boundaries
//! - [`application`] - Scheduler, orchestrator and commit protocol
//! - [`adapter`] - CLI, subprocess runner, HTTP clients, file state, upstream socket
//! - [`infrastructure`] - Configuration, wiring and the runtime loop
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - Deterministic test doubles for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
