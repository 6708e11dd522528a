//! Scripted [`ModelRunner`] double.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{RunResult, RunnerInput, RunnerOutput};
use crate::error::RunnerError;
use crate::port::outbound::runner::ModelRunner;

/// Runner that pops pre-loaded results and records every input it receives.
///
/// When the script is exhausted it answers with an incrementing run id.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    results: Arc<Mutex<VecDeque<Result<RunnerOutput, RunnerError>>>>,
    inputs: Arc<Mutex<Vec<RunnerInput>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, output: RunnerOutput) {
        self.results.lock().push_back(Ok(output));
    }

    pub fn push_err(&self, error: RunnerError) {
        self.results.lock().push_back(Err(error));
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().len()
    }

    pub fn inputs(&self) -> Vec<RunnerInput> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl ModelRunner for ScriptedRunner {
    async fn execute(&self, input: &RunnerInput) -> Result<RunResult, RunnerError> {
        let call = {
            let mut inputs = self.inputs.lock();
            inputs.push(input.clone());
            inputs.len() as i64
        };
        let next = self.results.lock().pop_front();
        let output = match next {
            Some(result) => result?,
            None => super::domain::runner_output(call),
        };
        Ok(RunResult {
            output,
            duration_ms: 0,
        })
    }
}
