//! Builders for domain primitives used across tests.

use serde_json::Map;

use crate::domain::{Candle, ModelConfig, RunnerOutput};

/// Candles with the given closes, one per minute starting at `start`.
pub fn candles_from_closes(start: i64, closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            time: start + i as i64 * 60_000,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        })
        .collect()
}

/// Minimal runner output carrying only a run id.
pub fn runner_output(run_id: i64) -> RunnerOutput {
    RunnerOutput {
        run_id,
        raw_signal: Vec::new(),
        series: Map::new(),
    }
}

/// Small model config with short windows.
pub fn model_config(formula: &str) -> ModelConfig {
    let mut config = ModelConfig::new(formula);
    config.slow_length = 2;
    config.fast_length = 1;
    config.signal_smoothing = 0;
    config.lookback = 3;
    config
}
