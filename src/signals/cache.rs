//! TTL read-through cache over the signal configuration store.
//!
//! Reads never wait on a refresh: the previous snapshot is served until a
//! new one is published atomically. Refreshes are single-flight; a failed
//! refresh keeps the stale snapshot and leaves the staleness clock
//! untouched so the next access retries.

use crate::metrics::Metrics;
use crate::models::{SignalDefinition, SignalPool};
use crate::services::{SignalConfigStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Immutable view of the enabled configuration, replaced wholesale on
/// refresh.
#[derive(Debug, Default)]
pub struct ConfigSnapshot {
    pub pools: Vec<SignalPool>,
    signals: HashMap<i64, SignalDefinition>,
}

impl ConfigSnapshot {
    pub fn signal(&self, id: i64) -> Option<&SignalDefinition> {
        self.signals.get(&id)
    }

    pub fn signals(&self) -> impl Iterator<Item = &SignalDefinition> {
        self.signals.values()
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }
}

struct CacheSlot {
    snapshot: Arc<ConfigSnapshot>,
    fetched_at: Option<Instant>,
}

pub struct ConfigCache {
    store: Arc<dyn SignalConfigStore>,
    ttl: Duration,
    slot: RwLock<CacheSlot>,
    refresh_lock: Mutex<()>,
    metrics: Option<Arc<Metrics>>,
}

impl ConfigCache {
    pub fn new(store: Arc<dyn SignalConfigStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            slot: RwLock::new(CacheSlot {
                snapshot: Arc::new(ConfigSnapshot::default()),
                fetched_at: None,
            }),
            refresh_lock: Mutex::new(()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Current configuration snapshot, refreshing first if the TTL has
    /// expired and no other caller is already doing so.
    pub async fn current(&self) -> Arc<ConfigSnapshot> {
        if !self.is_fresh().await {
            self.try_refresh().await;
        }
        self.slot.read().await.snapshot.clone()
    }

    async fn is_fresh(&self) -> bool {
        let slot = self.slot.read().await;
        matches!(slot.fetched_at, Some(at) if at.elapsed() < self.ttl)
    }

    async fn try_refresh(&self) {
        // Single-flight: losers serve the stale snapshot instead of queueing
        // behind the winner.
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            return;
        };

        // The refresh that held the lock before us may have just finished.
        if self.is_fresh().await {
            return;
        }

        match self.fetch().await {
            Ok(snapshot) => {
                let pools = snapshot.pools.len();
                let signals = snapshot.signal_count();
                let mut slot = self.slot.write().await;
                slot.snapshot = Arc::new(snapshot);
                slot.fetched_at = Some(Instant::now());
                drop(slot);
                if let Some(m) = &self.metrics {
                    m.config_cache_refreshes_total.inc();
                }
                debug!(
                    pools = pools,
                    signals = signals,
                    "Signal cache refreshed: {} pools, {} signals",
                    pools,
                    signals
                );
            }
            Err(e) => {
                // Snapshot and staleness clock stay as they were; the next
                // access retries.
                if let Some(m) = &self.metrics {
                    m.config_cache_refresh_failures_total.inc();
                }
                warn!(error = %e, "Failed to refresh signal cache, serving stale snapshot: {}", e);
            }
        }
    }

    /// An empty result set is a valid configuration and replaces the
    /// snapshot like any other.
    async fn fetch(&self) -> Result<ConfigSnapshot, StoreError> {
        let pools = self.store.list_enabled_pools().await?;
        let signals = self
            .store
            .list_enabled_signals()
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        Ok(ConfigSnapshot { pools, signals })
    }
}
