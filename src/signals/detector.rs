//! Edge-triggered signal detection orchestration.
//!
//! One `detect_signals` call evaluates every candidate signal the enabled
//! pools activate for a symbol. A trigger record is emitted only on a
//! false-to-true transition of a (signal, symbol) pair. Per-signal failures
//! are contained: they skip that signal for the cycle and never abort the
//! batch, so the call itself cannot fail.

use crate::metrics::Metrics;
use crate::models::{EdgeTriggerState, MarketUpdate, SignalDefinition, TriggerRecord};
use crate::services::TriggerSink;
use crate::signals::cache::{ConfigCache, ConfigSnapshot};
use crate::signals::resolver::MetricResolver;
use crate::signals::state::EdgeStateStore;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Outcome of evaluating one candidate signal.
#[derive(Debug)]
enum SignalEval {
    Triggered(Box<TriggerRecord>),
    NoTrigger,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    /// A pool references the id but no enabled definition is in the
    /// snapshot.
    UnknownSignal,
    Disabled,
    /// The stored condition failed to decode; skipped until corrected.
    MalformedCondition,
    MetricUnavailable,
}

pub struct SignalDetector {
    cache: ConfigCache,
    resolver: MetricResolver,
    states: EdgeStateStore,
    sink: Arc<dyn TriggerSink>,
    metrics: Option<Arc<Metrics>>,
}

impl SignalDetector {
    pub fn new(cache: ConfigCache, resolver: MetricResolver, sink: Arc<dyn TriggerSink>) -> Self {
        Self {
            cache,
            resolver,
            states: EdgeStateStore::new(),
            sink,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Evaluate all signals activated for `symbol` against `update` and
    /// return the rising-edge trigger records, possibly empty. Never fails.
    pub async fn detect_signals(&self, symbol: &str, update: &MarketUpdate) -> Vec<TriggerRecord> {
        let started = Instant::now();
        let snapshot = self.cache.current().await;

        // Candidate ids from every enabled pool monitoring this symbol,
        // deduplicated across pools.
        let mut candidate_ids = BTreeSet::new();
        for pool in snapshot
            .pools
            .iter()
            .filter(|p| p.enabled && p.monitors(symbol))
        {
            candidate_ids.extend(pool.signal_ids.iter().copied());
        }

        let mut triggered = Vec::new();
        for id in candidate_ids {
            if let Some(m) = &self.metrics {
                m.signal_evaluations_total.inc();
            }
            let eval = match snapshot.signal(id) {
                Some(def) => self.evaluate_signal(def, symbol, update).await,
                None => SignalEval::Skipped(SkipReason::UnknownSignal),
            };
            match eval {
                SignalEval::Triggered(record) => {
                    info!(
                        signal = %record.signal_name,
                        symbol = %symbol,
                        value = record.trigger_value,
                        threshold = record.threshold,
                        "Signal triggered: {} on {} (value={:.4}, threshold={})",
                        record.signal_name,
                        symbol,
                        record.trigger_value,
                        record.threshold
                    );
                    if let Some(m) = &self.metrics {
                        m.signal_triggers_total.inc();
                    }
                    self.persist(&record).await;
                    triggered.push(*record);
                }
                SignalEval::NoTrigger => {}
                SignalEval::Skipped(reason) => {
                    if let Some(m) = &self.metrics {
                        m.signal_skips_total.inc();
                    }
                    debug!(
                        signal_id = id,
                        symbol = %symbol,
                        reason = ?reason,
                        "Signal skipped"
                    );
                }
            }
        }

        if let Some(m) = &self.metrics {
            m.detect_duration_seconds
                .observe(started.elapsed().as_secs_f64());
        }
        triggered
    }

    async fn evaluate_signal(
        &self,
        def: &SignalDefinition,
        symbol: &str,
        update: &MarketUpdate,
    ) -> SignalEval {
        if !def.enabled {
            return SignalEval::Skipped(SkipReason::Disabled);
        }
        let Some(condition) = def.condition.as_ref() else {
            return SignalEval::Skipped(SkipReason::MalformedCondition);
        };
        let Some(value) = self
            .resolver
            .resolve(condition.metric, symbol, update, condition.time_window)
            .await
        else {
            return SignalEval::Skipped(SkipReason::MetricUnavailable);
        };

        let condition_met = condition.operator.evaluate(value, condition.threshold);
        let now = Utc::now();
        if !self.states.apply(def.id, symbol, condition_met, value, now) {
            return SignalEval::NoTrigger;
        }

        SignalEval::Triggered(Box::new(TriggerRecord {
            signal_id: def.id,
            signal_name: def.name.clone(),
            symbol: symbol.to_string(),
            metric: condition.metric,
            operator: condition.operator,
            threshold: condition.threshold,
            trigger_value: value,
            description: def.description.clone(),
            triggered_at: now,
        }))
    }

    /// Best-effort persistence: a sink failure is logged and counted but the
    /// record is still returned to the caller.
    async fn persist(&self, record: &TriggerRecord) {
        if let Err(e) = self.sink.record(record).await {
            if let Some(m) = &self.metrics {
                m.trigger_sink_failures_total.inc();
            }
            error!(
                signal_id = record.signal_id,
                symbol = %record.symbol,
                error = %e,
                "Failed to persist trigger record: {}",
                e
            );
        }
    }

    /// Current edge states keyed `"signal_id:symbol"`, for introspection.
    pub fn signal_states(&self) -> HashMap<String, EdgeTriggerState> {
        self.states.snapshot()
    }

    /// Drop edge states matching the filters; with none, drop all.
    pub fn reset_state(&self, signal_id: Option<i64>, symbol: Option<&str>) {
        self.states.reset(signal_id, symbol);
    }

    /// The configuration snapshot the engine currently evaluates against.
    pub async fn config(&self) -> Arc<ConfigSnapshot> {
        self.cache.current().await
    }
}
