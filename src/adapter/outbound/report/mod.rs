//! Failure reporter adapters.

use tracing::{error, warn};

use crate::port::outbound::report::{FailureReporter, FailureStage, RunFailure};

/// Reports run failures as structured log records.
///
/// Unacknowledged runs are warnings; runner and market-data failures are
/// errors.
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &RunFailure) {
        match failure.stage {
            FailureStage::Acknowledge => warn!(
                timeframe = %failure.timeframe,
                boundary = failure.boundary,
                source = %failure.source,
                stage = %failure.stage,
                message = %failure.message,
                "Run not acknowledged"
            ),
            FailureStage::Candles | FailureStage::Runner => error!(
                timeframe = %failure.timeframe,
                boundary = failure.boundary,
                source = %failure.source,
                stage = %failure.stage,
                message = %failure.message,
                "Run failed"
            ),
        }
    }
}
