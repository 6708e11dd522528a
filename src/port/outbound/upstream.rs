//! Upstream link port, as seen by the orchestrator.

use crate::domain::{Candle, Timeframe};

/// Typed event decoded from the upstream stream, or a connection transition.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamEvent {
    Connected,
    Disconnected {
        reason: String,
    },
    /// A replayed candle batch ending at `boundary`.
    Candles {
        timeframe: Timeframe,
        boundary: i64,
        candles: Vec<Candle>,
    },
    LoopReset,
    PaperOn,
    PaperOff,
    UpstreamStartup,
    UpstreamShutdown,
}

/// Health and lifecycle handle for the upstream event connection.
pub trait UpstreamLink: Send + Sync {
    /// Point-in-time connection status.
    fn is_connected(&self) -> bool;

    /// Tear down the connection and cancel any pending reconnect.
    fn close(&self);
}
