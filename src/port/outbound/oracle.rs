//! Acknowledging authority port.
//!
//! The authority's confirmation is what gates the durable commit of a
//! boundary. Any error means "unacknowledged".

use async_trait::async_trait;

use crate::domain::RunEnvelope;
use crate::error::AckError;

/// Confirmation returned by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorityAck {
    /// Identifier assigned by the authority.
    pub id: i64,
}

#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Submit a run envelope and wait for the authority's answer.
    async fn acknowledge(&self, envelope: &RunEnvelope) -> Result<AuthorityAck, AckError>;
}
