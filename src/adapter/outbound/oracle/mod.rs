//! Acknowledging authority adapters.

mod http;

pub use http::{HttpAcknowledger, DEFAULT_ACK_TIMEOUT};
