//! Result history adapters.

mod memory;

pub use memory::MemoryResultSink;
