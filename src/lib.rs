//! Edge-triggered signal detection over streaming market metrics.
//!
//! The engine evaluates user-defined threshold conditions against per-symbol
//! market updates and emits one trigger record per false-to-true transition.
//! Configuration (signal definitions and the pools that group them) is read
//! through a TTL cache; metric values come either from the update payload
//! itself or from an external indicator store.

pub mod config;
pub mod core;
pub mod db;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;

pub use metrics::Metrics;
pub use signals::detector::SignalDetector;
