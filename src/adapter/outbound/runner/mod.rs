//! Model runner adapters.

mod process;

pub use process::ProcessRunner;
