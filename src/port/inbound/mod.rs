//! Inbound ports (driving side): use cases exposed to CLI and transport adapters.

pub mod control;
