//! Candle fetcher over a simple REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, warn};

use crate::domain::{Candle, Timeframe};
use crate::error::{Error, Result};
use crate::port::outbound::market::CandleSource;

/// `GET {base}/candles?timeframe=..&end=..&limit=..` returning a JSON array.
pub struct HttpCandleSource {
    http: HttpClient,
    base_url: String,
}

impl HttpCandleSource {
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CandleSource for HttpCandleSource {
    async fn candles(&self, timeframe: Timeframe, end: i64, limit: usize) -> Result<Vec<Candle>> {
        let url = format!("{}/candles", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("timeframe", timeframe.as_str().to_string()),
                ("end", end.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Candles(format!("{url} returned {status}")));
        }

        let mut candles: Vec<Candle> = response.json().await?;
        candles.retain(|c| c.time <= end);
        candles.sort_by_key(|c| c.time);
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        debug!(timeframe = %timeframe, end, count = candles.len(), "Fetched candles");
        Ok(candles)
    }
}
