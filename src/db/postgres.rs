//! Postgres adapters for the signal configuration store and trigger log.
//!
//! Schema lifecycle is owned elsewhere; this module only reads
//! `signal_pools` / `signal_definitions` and appends to
//! `signal_trigger_logs`.

use crate::models::{SignalDefinition, SignalPool, TriggerCondition, TriggerRecord};
use crate::services::{SignalConfigStore, StoreError, TriggerSink};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, NoTls};
use tracing::{error, warn};

pub struct PgStore {
    client: Arc<RwLock<Option<Client>>>,
}

impl PgStore {
    /// Connect and spawn the connection driver task. The client slot is
    /// cleared when the connection ends, so later calls fail fast with
    /// `StoreError::NotConnected` instead of hanging.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls).await?;

        let slot = Arc::new(RwLock::new(Some(client)));
        let driver_slot = slot.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Postgres connection error: {}", e);
            }
            *driver_slot.write().await = None;
        });

        Ok(Self { client: slot })
    }

    pub async fn is_connected(&self) -> bool {
        self.client.read().await.is_some()
    }
}

#[async_trait]
impl SignalConfigStore for PgStore {
    async fn list_enabled_pools(&self) -> Result<Vec<SignalPool>, StoreError> {
        let guard = self.client.read().await;
        let Some(client) = guard.as_ref() else {
            return Err(StoreError::NotConnected);
        };

        let rows = client
            .query(
                "SELECT id, pool_name, signal_ids, symbols, enabled
                 FROM signal_pools
                 WHERE enabled = true",
                &[],
            )
            .await?;

        let mut pools = Vec::with_capacity(rows.len());
        for row in rows {
            let signal_ids: Option<Vec<i64>> = row.get(2);
            let symbols: Option<Vec<String>> = row.get(3);
            pools.push(SignalPool {
                id: row.get(0),
                name: row.get(1),
                signal_ids: signal_ids.unwrap_or_default(),
                symbols: symbols.unwrap_or_default(),
                enabled: row.get(4),
            });
        }
        Ok(pools)
    }

    async fn list_enabled_signals(&self) -> Result<Vec<SignalDefinition>, StoreError> {
        let guard = self.client.read().await;
        let Some(client) = guard.as_ref() else {
            return Err(StoreError::NotConnected);
        };

        let rows = client
            .query(
                "SELECT id, signal_name, description, trigger_condition, enabled
                 FROM signal_definitions
                 WHERE enabled = true",
                &[],
            )
            .await?;

        let mut signals = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get(0);
            let raw: Option<serde_json::Value> = row.get(3);
            // A row with a malformed condition is kept, not dropped: the
            // definition is visible but skipped at evaluation time, and one
            // bad row cannot poison the whole refresh.
            let condition = raw.and_then(|value| {
                match serde_json::from_value::<TriggerCondition>(value) {
                    Ok(condition) => Some(condition),
                    Err(e) => {
                        warn!(
                            signal_id = id,
                            error = %e,
                            "Malformed trigger condition, signal will be skipped: {}",
                            e
                        );
                        None
                    }
                }
            });
            signals.push(SignalDefinition {
                id,
                name: row.get(1),
                description: row.get(2),
                condition,
                enabled: row.get(4),
            });
        }
        Ok(signals)
    }
}

#[async_trait]
impl TriggerSink for PgStore {
    async fn record(&self, trigger: &TriggerRecord) -> Result<(), StoreError> {
        let guard = self.client.read().await;
        let Some(client) = guard.as_ref() else {
            return Err(StoreError::NotConnected);
        };

        client
            .execute(
                "INSERT INTO signal_trigger_logs
                 (signal_id, symbol, trigger_value, threshold, triggered_at)
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &trigger.signal_id,
                    &trigger.symbol,
                    &trigger.trigger_value,
                    &trigger.threshold,
                    &trigger.triggered_at,
                ],
            )
            .await?;
        Ok(())
    }
}
