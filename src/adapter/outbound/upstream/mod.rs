//! Upstream event subscriber.
//!
//! Keeps one persistent connection to the local event source, decodes the
//! double-newline framed JSON stream into [`UpstreamEvent`]s and reconnects
//! on a fixed delay after any close or failure.
//!
//! [`UpstreamEvent`]: crate::port::outbound::upstream::UpstreamEvent

mod endpoint;
mod frame;
mod message;
mod subscriber;

pub use endpoint::UpstreamEndpoint;
pub use frame::FrameDecoder;
pub use message::{decode, Decoded};
pub use subscriber::{UpstreamSubscriber, DEFAULT_RECONNECT_DELAY};
