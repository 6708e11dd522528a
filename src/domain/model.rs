//! Per-timeframe model parameters.

use serde::{Deserialize, Serialize};

use super::candle::PriceField;
use crate::error::ConfigError;

/// Moving-average kind passed to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    Sma,
    #[default]
    Ema,
    Wma,
    Rma,
}

/// Parameters for one timeframe's model run.
///
/// Runs read a snapshot of this at invocation time, so a patch applied while
/// a run is in flight only affects the next boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub formula: String,
    #[serde(default)]
    pub price_field: PriceField,
    #[serde(default)]
    pub ma_type: MaType,
    #[serde(default = "default_slow_length")]
    pub slow_length: u32,
    #[serde(default = "default_fast_length")]
    pub fast_length: u32,
    #[serde(default = "default_signal_smoothing")]
    pub signal_smoothing: u32,
    #[serde(default)]
    pub trace: bool,
    /// Number of candles fetched for a live run.
    #[serde(default = "default_lookback")]
    pub lookback: usize,
}

const fn default_slow_length() -> u32 {
    26
}

const fn default_fast_length() -> u32 {
    12
}

const fn default_signal_smoothing() -> u32 {
    9
}

const fn default_lookback() -> usize {
    300
}

impl ModelConfig {
    /// Config with default parameters for the given formula.
    pub fn new(formula: impl Into<String>) -> Self {
        Self {
            formula: formula.into(),
            price_field: PriceField::default(),
            ma_type: MaType::default(),
            slow_length: default_slow_length(),
            fast_length: default_fast_length(),
            signal_smoothing: default_signal_smoothing(),
            trace: false,
            lookback: default_lookback(),
        }
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.formula.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "formula" });
        }
        if self.slow_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "slow_length",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.fast_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fast_length",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.fast_length > self.slow_length {
            return Err(ConfigError::InvalidValue {
                field: "fast_length",
                reason: "must be <= slow_length".to_string(),
            });
        }
        if self.lookback == 0 {
            return Err(ConfigError::InvalidValue {
                field: "lookback",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Return a copy with the patch applied, validated.
    pub fn patched(&self, patch: &ModelConfigPatch) -> Result<Self, ConfigError> {
        let mut next = self.clone();
        if let Some(formula) = &patch.formula {
            next.formula.clone_from(formula);
        }
        if let Some(price_field) = patch.price_field {
            next.price_field = price_field;
        }
        if let Some(ma_type) = patch.ma_type {
            next.ma_type = ma_type;
        }
        if let Some(slow) = patch.slow_length {
            next.slow_length = slow;
        }
        if let Some(fast) = patch.fast_length {
            next.fast_length = fast;
        }
        if let Some(smoothing) = patch.signal_smoothing {
            next.signal_smoothing = smoothing;
        }
        if let Some(trace) = patch.trace {
            next.trace = trace;
        }
        if let Some(lookback) = patch.lookback {
            next.lookback = lookback;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial update from the control surface. Absent fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfigPatch {
    pub formula: Option<String>,
    pub price_field: Option<PriceField>,
    pub ma_type: Option<MaType>,
    pub slow_length: Option<u32>,
    pub fast_length: Option<u32>,
    pub signal_smoothing: Option<u32>,
    pub trace: Option<bool>,
    pub lookback: Option<usize>,
}
