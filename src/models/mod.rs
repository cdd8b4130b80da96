//! Shared data models spanning the engine layers.

pub mod market;
pub mod signal;

pub use market::{AssetContext, MarketUpdate};
pub use signal::{
    ComparisonOp, EdgeTriggerState, IndicatorKind, Metric, MetricSource, Period, SignalDefinition,
    SignalPool, TimeWindow, TriggerCondition, TriggerRecord,
};
