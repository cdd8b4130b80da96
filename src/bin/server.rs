//! Sigflow signal detection service.
//!
//! Connects to the Postgres configuration store, wires the detection
//! engine behind the HTTP surface and serves until interrupted. Market
//! updates are posted to `POST /api/detect/{symbol}` by the ingestion
//! layer.

use dotenvy::dotenv;
use sigflow::config;
use sigflow::core::http::{start_server, AppState, HealthStatus};
use sigflow::db::PgStore;
use sigflow::logging;
use sigflow::metrics::Metrics;
use sigflow::services::NullIndicatorStore;
use sigflow::signals::{ConfigCache, MetricResolver, SignalDetector};
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let env = config::get_environment();
    let port = config::get_http_port();
    let cache_ttl = config::get_cache_ttl();
    info!("Starting Sigflow signal detection service");
    info!(environment = %env, "Environment");

    let metrics = Arc::new(Metrics::new()?);

    let database_url = config::get_database_url();
    let store = Arc::new(PgStore::connect(&database_url).await.map_err(|e| {
        error!(error = %e, "Failed to connect to Postgres: {}", e);
        e
    })?);
    metrics.database_connected.set(1);
    info!("Postgres connected");

    let cache =
        ConfigCache::new(store.clone(), cache_ttl).with_metrics(metrics.clone());
    // Indicator-backed metrics stay unavailable until a deployment wires a
    // real indicator store; embedded metrics work regardless.
    let resolver = MetricResolver::new(Arc::new(NullIndicatorStore));
    let detector = Arc::new(
        SignalDetector::new(cache, resolver, store.clone()).with_metrics(metrics.clone()),
    );

    // Warm the configuration cache so the first update does not pay for it.
    let snapshot = detector.config().await;
    info!(
        pools = snapshot.pools.len(),
        signals = snapshot.signal_count(),
        "Configuration loaded: {} pools, {} signals",
        snapshot.pools.len(),
        snapshot.signal_count()
    );

    let state = AppState {
        detector,
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics: metrics.clone(),
        start_time: Arc::new(Instant::now()),
        database: Some(store),
    };

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, port).await {
            error!(error = %e, "HTTP server error");
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down signal detection service");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
