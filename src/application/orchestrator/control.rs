//! [`ControlPort`] implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use super::{sorted, Orchestrator};
use crate::domain::{Mode, ModelConfig, ModelConfigPatch, Timeframe};
use crate::error::{Error, Result};
use crate::port::inbound::control::{ControlPort, StatusSnapshot, TriggerReceipt};

#[async_trait]
impl ControlPort for Orchestrator {
    fn status(&self) -> StatusSnapshot {
        let (mode, last_run, paper_last_run) = {
            let state = self.state.read();
            (
                state.mode,
                sorted(&state.last_run),
                sorted(&state.paper_last_run),
            )
        };
        let mut in_flight: Vec<_> = self
            .in_flight
            .lock()
            .iter()
            .map(|(timeframe, boundary, _)| (*timeframe, *boundary))
            .collect();
        in_flight.sort_unstable();

        StatusSnapshot {
            mode,
            timeframes: self.configs.timeframes(),
            last_run,
            paper_last_run,
            upstream_connected: self.upstream_connected(),
            in_flight,
        }
    }

    fn model_config(&self, timeframe: Timeframe) -> Result<ModelConfig> {
        self.configs.snapshot(timeframe)
    }

    fn model_configs(&self) -> BTreeMap<Timeframe, ModelConfig> {
        self.configs.all()
    }

    fn patch_model_config(
        &self,
        timeframe: Timeframe,
        patch: &ModelConfigPatch,
    ) -> Result<ModelConfig> {
        self.configs.patch(timeframe, patch)
    }

    async fn trigger_run(&self, timeframe: Timeframe) -> Result<TriggerReceipt> {
        let mode = self.mode();
        if mode != Mode::Live {
            return Err(Error::ModeMismatch {
                expected: Mode::Live,
                actual: mode,
            });
        }
        if !self.configs.contains(timeframe) {
            return Err(Error::UnknownTimeframe(timeframe));
        }

        let boundary = timeframe.boundary(self.services.clock.now_ms());
        self.scheduler.mark_fired(timeframe, boundary);
        info!(timeframe = %timeframe, boundary, "Manual run triggered");

        let outcome = self.run_live(timeframe, boundary).await?;
        Ok(TriggerReceipt {
            timeframe,
            boundary,
            outcome,
        })
    }

    fn paper_on(&self) {
        self.enter_paper();
    }

    fn paper_off(&self) {
        self.enter_live();
    }
}
