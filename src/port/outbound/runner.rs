//! Model runner port.

use async_trait::async_trait;

use crate::domain::{RunResult, RunnerInput};
use crate::error::RunnerError;

/// Executes one computation pass and returns its parsed output.
///
/// Implementations hold no state between calls, so retrying the same input
/// is always safe.
#[async_trait]
pub trait ModelRunner: Send + Sync {
    async fn execute(&self, input: &RunnerInput) -> Result<RunResult, RunnerError>;
}
