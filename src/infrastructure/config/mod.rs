//! Infrastructure configuration modules.

pub mod logging;
pub mod runtime;
pub mod service;
pub mod settings;
pub mod storage;
