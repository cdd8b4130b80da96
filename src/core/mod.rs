//! Service shell around the detection engine.

pub mod http;

pub use http::*;
