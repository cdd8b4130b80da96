//! HTTP endpoint server using Axum.
//!
//! Exposes the detection seam (`POST /api/detect/{symbol}`), edge-state
//! introspection and reset, read-only views of the configuration the
//! engine currently evaluates against, plus health and Prometheus metrics.
//! Configuration mutation endpoints are deliberately absent: the
//! configuration store is owned by an external collaborator.

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::db::PgStore;
use crate::metrics::Metrics;
use crate::models::{EdgeTriggerState, MarketUpdate, SignalDefinition, SignalPool, TriggerRecord};
use crate::signals::SignalDetector;

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<SignalDetector>,
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub database: Option<Arc<PgStore>>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    let database_connected = match &state.database {
        Some(db) => db.is_connected().await,
        None => false,
    };
    state
        .metrics
        .database_connected
        .set(database_connected as i64);
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "database_connected": database_connected,
        "service": "sigflow-signal-engine"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    state.metrics.http_requests_in_flight.dec();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

/// Run one detection pass for a symbol against the posted market update.
async fn detect_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Json(update): Json<MarketUpdate>,
) -> Json<Vec<TriggerRecord>> {
    let triggers = state.detector.detect_signals(&symbol, &update).await;
    Json(triggers)
}

/// Edge-trigger states keyed `"signal_id:symbol"`.
async fn signal_states(
    State(state): State<AppState>,
) -> Json<HashMap<String, EdgeTriggerState>> {
    Json(state.detector.signal_states())
}

#[derive(Debug, Default, Deserialize)]
struct ResetStateRequest {
    signal_id: Option<i64>,
    symbol: Option<String>,
}

/// Drop edge states matching the body's filters; an empty body drops all.
async fn reset_states(
    State(state): State<AppState>,
    Json(request): Json<ResetStateRequest>,
) -> StatusCode {
    state
        .detector
        .reset_state(request.signal_id, request.symbol.as_deref());
    StatusCode::NO_CONTENT
}

/// Signal definitions in the cache snapshot the engine currently sees.
async fn list_signals(State(state): State<AppState>) -> Json<Vec<SignalDefinition>> {
    let snapshot = state.detector.config().await;
    let mut signals: Vec<SignalDefinition> = snapshot.signals().cloned().collect();
    signals.sort_by_key(|s| s.id);
    Json(signals)
}

/// Signal pools in the cache snapshot the engine currently sees.
async fn list_pools(State(state): State<AppState>) -> Json<Vec<SignalPool>> {
    let snapshot = state.detector.config().await;
    Json(snapshot.pools.clone())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/detect/{symbol}", post(detect_symbol))
        .route("/api/signals", get(list_signals))
        .route("/api/signals/states", get(signal_states))
        .route("/api/signals/reset", post(reset_states))
        .route("/api/pools", get(list_pools))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
