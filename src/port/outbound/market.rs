//! Market-data port used by live runs.

use async_trait::async_trait;

use crate::domain::{Candle, Timeframe};
use crate::error::Result;

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Up to `limit` candles for `timeframe` closing at or before `end`,
    /// oldest first.
    async fn candles(&self, timeframe: Timeframe, end: i64, limit: usize) -> Result<Vec<Candle>>;
}
