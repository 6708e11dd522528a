//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic: configuration, wiring, the runtime loop and operator-facing
//! health and status reporting.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`health`] - Preflight checks used by `cadence check`
//! - [`runtime`] - Event loop driving the orchestrator
//! - [`status_file`] - Status file for external monitoring

pub mod bootstrap;
pub mod config;
pub mod health;
pub mod runtime;
pub mod status_file;
