//! Durable last-run state adapters.

mod file;

pub use file::{write_atomic, JsonFileLastRunStore};
