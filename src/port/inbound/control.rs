//! Control surface consumed by inbound adapters (CLI, transport).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Mode, ModelConfig, ModelConfigPatch, RunOutcome, Timeframe};
use crate::error::Result;

/// Point-in-time view of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub timeframes: Vec<Timeframe>,
    /// Last acknowledged live boundary per timeframe.
    pub last_run: BTreeMap<Timeframe, i64>,
    /// Last acknowledged paper boundary per timeframe.
    pub paper_last_run: BTreeMap<Timeframe, i64>,
    pub upstream_connected: bool,
    /// Runs currently executing, as (timeframe, boundary).
    pub in_flight: Vec<(Timeframe, i64)>,
}

/// Result of a manual trigger request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerReceipt {
    pub timeframe: Timeframe,
    pub boundary: i64,
    pub outcome: RunOutcome,
}

/// Operator-facing use cases.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait ControlPort: Send + Sync {
    /// Current mode, last runs and upstream health.
    fn status(&self) -> StatusSnapshot;

    /// Model parameters for one timeframe.
    fn model_config(&self, timeframe: Timeframe) -> Result<ModelConfig>;

    /// Model parameters for every tracked timeframe.
    fn model_configs(&self) -> BTreeMap<Timeframe, ModelConfig>;

    /// Apply a partial update; takes effect from the next run.
    fn patch_model_config(
        &self,
        timeframe: Timeframe,
        patch: &ModelConfigPatch,
    ) -> Result<ModelConfig>;

    /// Run the current boundary of `timeframe` now and wait for the outcome.
    /// Live mode only.
    async fn trigger_run(&self, timeframe: Timeframe) -> Result<TriggerReceipt>;

    /// Switch to paper mode.
    fn paper_on(&self);

    /// Switch to live mode, re-seeding the scheduler from durable state.
    fn paper_off(&self);
}
