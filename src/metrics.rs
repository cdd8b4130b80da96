//! Prometheus metrics for the detection engine and its HTTP surface.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};

/// Collectors registered once at startup and shared through `Arc`.
pub struct Metrics {
    registry: Registry,

    // Detection engine
    pub signal_evaluations_total: IntCounter,
    pub signal_triggers_total: IntCounter,
    pub signal_skips_total: IntCounter,
    pub detect_duration_seconds: Histogram,
    pub trigger_sink_failures_total: IntCounter,

    // Configuration cache
    pub config_cache_refreshes_total: IntCounter,
    pub config_cache_refresh_failures_total: IntCounter,

    // HTTP surface
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,

    pub database_connected: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let signal_evaluations_total = IntCounter::new(
            "signal_evaluations_total",
            "Candidate signal evaluations performed",
        )?;
        registry.register(Box::new(signal_evaluations_total.clone()))?;

        let signal_triggers_total = IntCounter::new(
            "signal_triggers_total",
            "Trigger records emitted on rising edges",
        )?;
        registry.register(Box::new(signal_triggers_total.clone()))?;

        let signal_skips_total = IntCounter::new(
            "signal_skips_total",
            "Candidate signals skipped (disabled, malformed or unresolvable)",
        )?;
        registry.register(Box::new(signal_skips_total.clone()))?;

        let detect_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "signal_detect_duration_seconds",
            "Wall time of one detect_signals invocation",
        ))?;
        registry.register(Box::new(detect_duration_seconds.clone()))?;

        let trigger_sink_failures_total = IntCounter::new(
            "trigger_sink_failures_total",
            "Trigger records that could not be persisted",
        )?;
        registry.register(Box::new(trigger_sink_failures_total.clone()))?;

        let config_cache_refreshes_total = IntCounter::new(
            "config_cache_refreshes_total",
            "Successful configuration cache refreshes",
        )?;
        registry.register(Box::new(config_cache_refreshes_total.clone()))?;

        let config_cache_refresh_failures_total = IntCounter::new(
            "config_cache_refresh_failures_total",
            "Configuration cache refreshes that failed and kept the stale snapshot",
        )?;
        registry.register(Box::new(config_cache_refresh_failures_total.clone()))?;

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests")?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;

        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        let database_connected = IntGauge::new(
            "database_connected",
            "Whether the configuration database connection is live (1) or lost (0)",
        )?;
        registry.register(Box::new(database_connected.clone()))?;

        Ok(Self {
            registry,
            signal_evaluations_total,
            signal_triggers_total,
            signal_skips_total,
            detect_duration_seconds,
            trigger_sink_failures_total,
            config_cache_refreshes_total,
            config_cache_refresh_failures_total,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            database_connected,
        })
    }

    /// Render all registered collectors in Prometheus text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
