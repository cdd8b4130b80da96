//! In-memory store implementations.
//!
//! These back the test suites and serve as wiring defaults where a
//! deployment has no real backend for a capability.

use crate::models::{IndicatorKind, Period, SignalDefinition, SignalPool, TriggerRecord};
use crate::services::{IndicatorStore, SignalConfigStore, StoreError, TriggerSink};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Mutable in-memory configuration source.
///
/// Contents are returned exactly as seeded; the detector applies its own
/// enabled checks. A fetch counter and failure/latency injection support
/// cache behavior tests.
#[derive(Default)]
pub struct MemoryConfigStore {
    pools: RwLock<Vec<SignalPool>>,
    signals: RwLock<Vec<SignalDefinition>>,
    // One fetch round = one list_enabled_pools call; the paired
    // list_enabled_signals call is not counted separately.
    fetches: AtomicUsize,
    failing: AtomicBool,
    fetch_delay_ms: AtomicU64,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_pools(&self, pools: Vec<SignalPool>) {
        *self.pools.write().await = pools;
    }

    pub async fn set_signals(&self, signals: Vec<SignalDefinition>) {
        *self.signals.write().await = signals;
    }

    /// While set, both list calls fail with `StoreError::Other`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Artificial latency applied at the start of each fetch round.
    pub fn set_fetch_delay(&self, delay: Duration) {
        self.fetch_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of fetch rounds that reached this store, failed ones included.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalConfigStore for MemoryConfigStore {
    async fn list_enabled_pools(&self) -> Result<Vec<SignalPool>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay_ms = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Other("injected configuration failure".into()));
        }
        Ok(self.pools.read().await.clone())
    }

    async fn list_enabled_signals(&self) -> Result<Vec<SignalDefinition>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Other("injected configuration failure".into()));
        }
        Ok(self.signals.read().await.clone())
    }
}

/// Indicator store preloaded with (symbol, kind, period) values.
#[derive(Default)]
pub struct MemoryIndicatorStore {
    values: DashMap<(String, IndicatorKind, Period), f64>,
    failing: AtomicBool,
}

impl MemoryIndicatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, symbol: &str, kind: IndicatorKind, period: Period, value: f64) {
        self.values.insert((symbol.to_string(), kind, period), value);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl IndicatorStore for MemoryIndicatorStore {
    async fn resolve_indicator(
        &self,
        symbol: &str,
        kind: IndicatorKind,
        period: Period,
    ) -> Result<Option<f64>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Other("injected indicator failure".into()));
        }
        Ok(self
            .values
            .get(&(symbol.to_string(), kind, period))
            .map(|v| *v))
    }
}

/// Indicator store with no data. Signals on indicator-backed metrics are
/// skipped until a real store is wired in.
pub struct NullIndicatorStore;

#[async_trait]
impl IndicatorStore for NullIndicatorStore {
    async fn resolve_indicator(
        &self,
        _symbol: &str,
        _kind: IndicatorKind,
        _period: Period,
    ) -> Result<Option<f64>, StoreError> {
        Ok(None)
    }
}

/// Trigger sink that collects records in memory.
#[derive(Default)]
pub struct MemoryTriggerSink {
    records: Mutex<Vec<TriggerRecord>>,
    failing: AtomicBool,
}

impl MemoryTriggerSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<TriggerRecord> {
        self.records.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl TriggerSink for MemoryTriggerSink {
    async fn record(&self, trigger: &TriggerRecord) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Other("injected sink failure".into()));
        }
        self.records.lock().await.push(trigger.clone());
        Ok(())
    }
}
