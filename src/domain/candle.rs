//! Candle samples and price-field selection.

use serde::{Deserialize, Serialize};

/// OHLCV sample at a point in time (millisecond timestamp).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    /// Value of the requested field, computing derived prices on demand.
    #[must_use]
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::Volume => self.volume,
            PriceField::Hl2 => (self.high + self.low) / 2.0,
            PriceField::Hlc3 => (self.high + self.low + self.close) / 3.0,
            PriceField::Ohlc4 => (self.open + self.high + self.low + self.close) / 4.0,
        }
    }
}

/// Which candle field feeds the model signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
    Hl2,
    Hlc3,
    Ohlc4,
}
