//! Edge-triggered signal detection engine.

pub mod cache;
pub mod detector;
pub mod resolver;
pub mod state;

pub use cache::{ConfigCache, ConfigSnapshot};
pub use detector::SignalDetector;
pub use resolver::MetricResolver;
pub use state::EdgeStateStore;
