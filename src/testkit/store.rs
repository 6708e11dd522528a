//! In-memory stand-ins for durable state and market data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::domain::{Candle, RunSource, Timeframe};
use crate::error::{Error, Result, StateError};
use crate::port::outbound::market::CandleSource;
use crate::port::outbound::state::{LastRunStore, LastRuns};

/// Last-run store kept in memory, with switchable write failures.
#[derive(Clone, Default)]
pub struct MemoryLastRunStore {
    runs: Arc<Mutex<HashMap<RunSource, LastRuns>>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryLastRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_live(runs: LastRuns) -> Self {
        let store = Self::default();
        store.runs.lock().insert(RunSource::Live, runs);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, source: RunSource, timeframe: Timeframe) -> Option<i64> {
        self.runs
            .lock()
            .get(&source)
            .and_then(|runs| runs.get(&timeframe).copied())
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

impl LastRunStore for MemoryLastRunStore {
    fn load(&self, source: RunSource) -> std::result::Result<LastRuns, StateError> {
        Ok(self.runs.lock().get(&source).cloned().unwrap_or_default())
    }

    fn save(&self, source: RunSource, runs: &LastRuns) -> std::result::Result<(), StateError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StateError::Io {
                path: "memory".to_string(),
                source: std::io::Error::other("write disabled"),
            });
        }
        *self.writes.lock() += 1;
        self.runs.lock().insert(source, runs.clone());
        Ok(())
    }
}

/// Candle source returning a fixed batch, or an error when failing.
///
/// While paused, requests are recorded and then held until [`resume`].
///
/// [`resume`]: StaticCandleSource::resume
#[derive(Clone, Default)]
pub struct StaticCandleSource {
    candles: Arc<Mutex<Vec<Candle>>>,
    fail: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    released: Arc<Notify>,
    requests: Arc<Mutex<Vec<(Timeframe, i64, usize)>>>,
}

impl StaticCandleSource {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles: Arc::new(Mutex::new(candles)),
            ..Default::default()
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.released.notify_waiters();
        self.released.notify_one();
    }

    pub fn requests(&self) -> Vec<(Timeframe, i64, usize)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CandleSource for StaticCandleSource {
    async fn candles(&self, timeframe: Timeframe, end: i64, limit: usize) -> Result<Vec<Candle>> {
        self.requests.lock().push((timeframe, end, limit));
        while self.paused.load(Ordering::SeqCst) {
            self.released.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Candles("scripted failure".to_string()));
        }
        let candles = self.candles.lock();
        let skip = candles.len().saturating_sub(limit);
        Ok(candles[skip..].to_vec())
    }
}
