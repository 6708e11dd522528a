//! Application layer: scheduling, orchestration and the run protocol.
//!
//! Depends only on domain types and ports; adapters are injected.

pub mod config_store;
pub mod orchestrator;
pub mod scheduler;
pub mod stats;
pub mod watchdog;

pub use config_store::ModelConfigStore;
pub use orchestrator::{Collaborators, Orchestrator};
pub use scheduler::{BoundaryScheduler, Trigger};
pub use stats::{RunCounts, RunStats};
pub use watchdog::Watchdog;
