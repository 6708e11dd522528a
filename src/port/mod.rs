//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────────┐
//!   ControlPort ──▶      Orchestrator        │
//!                 │  (scheduler + protocol)  │
//!                 └────────────┬─────────────┘
//!        ┌──────────┬──────────┼───────────┬────────────┐
//!        ▼          ▼          ▼           ▼            ▼
//!   ModelRunner Acknowledger LastRunStore ResultSink  Notifier
//! ```

pub mod inbound;
pub mod outbound;
