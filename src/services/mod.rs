//! Capabilities the engine consumes from collaborators.
//!
//! The detector owns nothing external: configuration, indicator values and
//! trigger persistence all arrive through these traits so deployments can
//! wire their own backends.

pub mod memory;

use crate::models::{IndicatorKind, Period, SignalDefinition, SignalPool, TriggerRecord};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryConfigStore, MemoryIndicatorStore, MemoryTriggerSink, NullIndicatorStore};

/// Failure of an external store call.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("database connection not available")]
    NotConnected,
    #[error("store error: {0}")]
    Other(String),
}

/// Source of enabled signal pools and definitions.
#[async_trait]
pub trait SignalConfigStore: Send + Sync {
    async fn list_enabled_pools(&self) -> Result<Vec<SignalPool>, StoreError>;
    async fn list_enabled_signals(&self) -> Result<Vec<SignalDefinition>, StoreError>;
}

/// Source of time-windowed indicator values.
///
/// `Ok(None)` means the indicator has no value for that symbol and period
/// right now; the affected signal is skipped for the cycle.
#[async_trait]
pub trait IndicatorStore: Send + Sync {
    async fn resolve_indicator(
        &self,
        symbol: &str,
        kind: IndicatorKind,
        period: Period,
    ) -> Result<Option<f64>, StoreError>;
}

/// Best-effort persistence for emitted trigger records.
#[async_trait]
pub trait TriggerSink: Send + Sync {
    async fn record(&self, trigger: &TriggerRecord) -> Result<(), StoreError>;
}
