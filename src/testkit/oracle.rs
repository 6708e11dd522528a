//! Scripted [`Acknowledger`] double.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::RunEnvelope;
use crate::error::AckError;
use crate::port::outbound::oracle::{Acknowledger, AuthorityAck};

/// Acknowledger that pops pre-loaded answers and records submissions.
///
/// When the script is exhausted it acknowledges with an incrementing id.
#[derive(Clone, Default)]
pub struct ScriptedAcknowledger {
    answers: Arc<Mutex<VecDeque<Result<i64, String>>>>,
    submitted: Arc<Mutex<Vec<RunEnvelope>>>,
}

impl ScriptedAcknowledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ack(&self, id: i64) {
        self.answers.lock().push_back(Ok(id));
    }

    pub fn push_failure(&self, reason: &str) {
        self.answers.lock().push_back(Err(reason.to_string()));
    }

    pub fn submitted(&self) -> Vec<RunEnvelope> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl Acknowledger for ScriptedAcknowledger {
    async fn acknowledge(&self, envelope: &RunEnvelope) -> Result<AuthorityAck, AckError> {
        let count = {
            let mut submitted = self.submitted.lock();
            submitted.push(envelope.clone());
            submitted.len() as i64
        };
        match self.answers.lock().pop_front() {
            Some(Ok(id)) => Ok(AuthorityAck { id }),
            Some(Err(body)) => Err(AckError::Rejected { status: 503, body }),
            None => Ok(AuthorityAck { id: 1000 + count }),
        }
    }
}
