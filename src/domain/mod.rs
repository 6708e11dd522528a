//! Pure domain types: timeframes, candles, model parameters, run records.

pub mod candle;
pub mod mode;
pub mod model;
pub mod run;
pub mod timeframe;

pub use candle::{Candle, PriceField};
pub use mode::Mode;
pub use model::{MaType, ModelConfig, ModelConfigPatch};
pub use run::{
    build_input, RunEnvelope, RunOutcome, RunResult, RunSource, RunnerInput, RunnerOptions, RunnerOutput,
};
pub use timeframe::Timeframe;
