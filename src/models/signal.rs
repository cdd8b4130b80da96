//! Signal configuration and trigger data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute tolerance for `==` / `!=` comparisons on metric values.
const EQ_EPSILON: f64 = 1e-9;

/// Metric identifiers a trigger condition can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Oi,
    FundingRate,
    OiDeltaPercent,
    Cvd,
    DepthRatio,
    OrderImbalance,
    TakerBuyRatio,
}

/// Where a metric's current value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Read directly off the market update payload.
    Embedded,
    /// Fetched from the external indicator store.
    Indicator(IndicatorKind),
}

/// Indicator types understood by the external indicator store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[serde(rename = "OI_DELTA")]
    OiDelta,
    #[serde(rename = "CVD")]
    Cvd,
    #[serde(rename = "DEPTH")]
    Depth,
    #[serde(rename = "IMBALANCE")]
    Imbalance,
    #[serde(rename = "TAKER")]
    Taker,
}

impl Metric {
    pub fn source(self) -> MetricSource {
        match self {
            Self::Oi | Self::FundingRate => MetricSource::Embedded,
            Self::OiDeltaPercent => MetricSource::Indicator(IndicatorKind::OiDelta),
            Self::Cvd => MetricSource::Indicator(IndicatorKind::Cvd),
            Self::DepthRatio => MetricSource::Indicator(IndicatorKind::Depth),
            Self::OrderImbalance => MetricSource::Indicator(IndicatorKind::Imbalance),
            Self::TakerBuyRatio => MetricSource::Indicator(IndicatorKind::Taker),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oi => "oi",
            Self::FundingRate => "funding_rate",
            Self::OiDeltaPercent => "oi_delta_percent",
            Self::Cvd => "cvd",
            Self::DepthRatio => "depth_ratio",
            Self::OrderImbalance => "order_imbalance",
            Self::TakerBuyRatio => "taker_buy_ratio",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IndicatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OiDelta => "OI_DELTA",
            Self::Cvd => "CVD",
            Self::Depth => "DEPTH",
            Self::Imbalance => "IMBALANCE",
            Self::Taker => "TAKER",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators, with the short `abs_*` spellings accepted as
/// aliases of the long forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "abs_greater_than", alias = "abs_gt")]
    AbsGreaterThan,
    #[serde(rename = "abs_less_than", alias = "abs_lt")]
    AbsLessThan,
}

impl ComparisonOp {
    /// Compare `value` against `threshold`. Equality is within an absolute
    /// tolerance of 1e-9.
    pub fn evaluate(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterThan => value > threshold,
            Self::GreaterEqual => value >= threshold,
            Self::LessThan => value < threshold,
            Self::LessEqual => value <= threshold,
            Self::Equal => (value - threshold).abs() < EQ_EPSILON,
            Self::NotEqual => (value - threshold).abs() >= EQ_EPSILON,
            Self::AbsGreaterThan => value.abs() > threshold,
            Self::AbsLessThan => value.abs() < threshold,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::GreaterEqual => ">=",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::AbsGreaterThan => "abs_greater_than",
            Self::AbsLessThan => "abs_less_than",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation periods understood by the indicator store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
}

impl Period {
    /// Bucket a window length in seconds into the nearest coarser period.
    pub fn from_secs(secs: u64) -> Self {
        match secs {
            0..=60 => Self::M1,
            61..=180 => Self::M3,
            181..=300 => Self::M5,
            301..=900 => Self::M15,
            901..=1800 => Self::M30,
            1801..=3600 => Self::H1,
            3601..=7200 => Self::H2,
            _ => Self::H4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M3 => "3m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H2 => "2h",
            Self::H4 => "4h",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation window of a condition: either a duration in seconds or an
/// already-bucketed period label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeWindow {
    Seconds(u64),
    Period(Period),
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::Seconds(60)
    }
}

impl TimeWindow {
    /// The indicator-store period this window maps to. Period labels pass
    /// through unchanged.
    pub fn period(self) -> Period {
        match self {
            Self::Seconds(secs) => Period::from_secs(secs),
            Self::Period(p) => p,
        }
    }
}

/// Threshold condition attached to a signal definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCondition {
    pub metric: Metric,
    pub operator: ComparisonOp,
    pub threshold: f64,
    #[serde(default)]
    pub time_window: TimeWindow,
}

/// A signal definition as loaded from the configuration store.
///
/// `condition` is `None` when the stored condition document failed to decode;
/// such a definition is skipped at evaluation time until corrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDefinition {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub condition: Option<TriggerCondition>,
    pub enabled: bool,
}

/// A pool groups a set of signals and the symbols they monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPool {
    pub id: i64,
    pub name: String,
    pub signal_ids: Vec<i64>,
    pub symbols: Vec<String>,
    pub enabled: bool,
}

impl SignalPool {
    pub fn monitors(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

/// Last-known activation state of one (signal, symbol) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTriggerState {
    pub signal_id: i64,
    pub symbol: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
}

impl EdgeTriggerState {
    pub fn new(signal_id: i64, symbol: String) -> Self {
        Self {
            signal_id,
            symbol,
            is_active: false,
            last_value: None,
            last_check: None,
        }
    }
}

/// Record of one rising-edge trigger, handed to the trigger sink and
/// returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub signal_id: i64,
    pub signal_name: String,
    pub symbol: String,
    pub metric: Metric,
    pub operator: ComparisonOp,
    pub threshold: f64,
    pub trigger_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub triggered_at: DateTime<Utc>,
}
