//! Per-pair activation state for edge detection.
//!
//! Keyed by (signal id, symbol) over a sharded map; the read-decide-write
//! step for one pair happens under that pair's entry guard, so concurrent
//! updates to the same pair cannot interleave.

use crate::models::EdgeTriggerState;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;

#[derive(Default)]
pub struct EdgeStateStore {
    states: DashMap<(i64, String), EdgeTriggerState>,
}

impl EdgeStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one evaluation outcome to the pair's state and report whether
    /// it is a rising edge.
    ///
    /// The stored state is updated unconditionally: activation follows
    /// `condition_met` in both directions, and the observed value and check
    /// time are recorded whether or not a trigger fires.
    pub fn apply(
        &self,
        signal_id: i64,
        symbol: &str,
        condition_met: bool,
        value: f64,
        now: DateTime<Utc>,
    ) -> bool {
        let mut entry = self
            .states
            .entry((signal_id, symbol.to_string()))
            .or_insert_with(|| EdgeTriggerState::new(signal_id, symbol.to_string()));
        let rising = condition_met && !entry.is_active;
        entry.is_active = condition_met;
        entry.last_value = Some(value);
        entry.last_check = Some(now);
        rising
    }

    pub fn get(&self, signal_id: i64, symbol: &str) -> Option<EdgeTriggerState> {
        self.states
            .get(&(signal_id, symbol.to_string()))
            .map(|e| e.value().clone())
    }

    /// All tracked states keyed `"signal_id:symbol"`.
    pub fn snapshot(&self) -> HashMap<String, EdgeTriggerState> {
        self.states
            .iter()
            .map(|e| (format!("{}:{}", e.key().0, e.key().1), e.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Drop states matching the given filters. With no filters everything
    /// is dropped; with both, only pairs matching both.
    pub fn reset(&self, signal_id: Option<i64>, symbol: Option<&str>) {
        if signal_id.is_none() && symbol.is_none() {
            self.states.clear();
            return;
        }
        self.states.retain(|(id, sym), _| {
            let id_match = signal_id.map_or(true, |want| *id == want);
            let sym_match = symbol.map_or(true, |want| sym == want);
            !(id_match && sym_match)
        });
    }
}
