//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, detection behavior, state management, and metrics.


use serde_json::{json, Value};
use sigflow::models::{SignalDefinition, SignalPool, TriggerCondition};

use test_utils::TestApiServer;

fn pool(id: i64, symbols: &[&str], signal_ids: &[i64]) -> SignalPool {
    SignalPool {
        id,
        name: format!("pool-{}", id),
        signal_ids: signal_ids.to_vec(),
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        enabled: true,
    }
}

fn oi_above(id: i64, threshold: f64) -> SignalDefinition {
    let condition: TriggerCondition = serde_json::from_value(json!({
        "metric": "oi",
        "operator": ">",
        "threshold": threshold
    }))
    .expect("decode condition");
    SignalDefinition {
        id,
        name: format!("signal-{}", id),
        description: None,
        condition: Some(condition),
        enabled: true,
    }
}

async fn seeded_server() -> TestApiServer {
    TestApiServer::with_config(vec![pool(1, &["BTC"], &[1])], vec![oi_above(1, 1_000_000.0)])
        .await
}

fn oi_payload(open_interest: &str) -> Value {
    json!({"asset_ctx": {"openInterest": open_interest}})
}

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["database_connected"], false);
    assert_eq!(body["service"], "sigflow-signal-engine");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    assert!(
        body.contains("http_requests_total"),
        "Expected http_requests_total metric"
    );
    assert!(
        body.contains("http_request_duration_seconds"),
        "Expected http_request_duration_seconds metric"
    );
    assert!(
        body.contains("signal_evaluations_total"),
        "Expected signal_evaluations_total metric"
    );
    assert!(
        body.contains("signal_triggers_total"),
        "Expected signal_triggers_total metric"
    );
    assert!(
        body.contains("config_cache_refreshes_total"),
        "Expected config_cache_refreshes_total metric"
    );
}

#[tokio::test]
async fn detect_endpoint_returns_trigger_records() {
    let app = seeded_server().await;

    let response = app
        .server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let records = body.as_array().expect("array body");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["signal_id"], 1);
    assert_eq!(records[0]["symbol"], "BTC");
    assert_eq!(records[0]["metric"], "oi");
    assert_eq!(records[0]["operator"], ">");
    assert_eq!(records[0]["trigger_value"], 1_100_000.0);
    assert!(records[0]["triggered_at"].is_string());
}

#[tokio::test]
async fn detect_endpoint_is_edge_triggered_across_requests() {
    let app = seeded_server().await;

    let first = app
        .server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;
    assert_eq!(first.json::<Value>().as_array().map(Vec::len), Some(1));

    // condition still holds, no new edge
    let second = app
        .server
        .post("/api/detect/BTC")
        .json(&oi_payload("1200000"))
        .await;
    assert_eq!(second.status_code(), 200);
    assert_eq!(second.json::<Value>().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn detect_endpoint_returns_empty_for_unmonitored_symbol() {
    let app = seeded_server().await;

    let response = app
        .server
        .post("/api/detect/DOGE")
        .json(&oi_payload("1100000"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn detect_endpoint_tolerates_minimal_payload() {
    let app = seeded_server().await;

    let response = app.server.post("/api/detect/BTC").json(&json!({})).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn states_endpoint_reflects_past_detections() {
    let app = seeded_server().await;
    app.server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;

    let response = app.server.get("/api/signals/states").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["1:BTC"]["is_active"], true);
    assert_eq!(body["1:BTC"]["last_value"], 1_100_000.0);
    assert_eq!(body["1:BTC"]["symbol"], "BTC");
}

#[tokio::test]
async fn reset_endpoint_rearms_triggered_signals() {
    let app = seeded_server().await;
    app.server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;

    let reset = app.server.post("/api/signals/reset").json(&json!({})).await;
    assert_eq!(reset.status_code(), 204);

    let states: Value = app.server.get("/api/signals/states").await.json();
    assert!(states.as_object().expect("object body").is_empty());

    // the same crossing fires again after the reset
    let response = app
        .server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;
    assert_eq!(response.json::<Value>().as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn reset_endpoint_filters_leave_other_state_in_place() {
    let app = TestApiServer::with_config(
        vec![pool(1, &["BTC", "ETH"], &[1])],
        vec![oi_above(1, 1_000_000.0)],
    )
    .await;
    app.server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;
    app.server
        .post("/api/detect/ETH")
        .json(&oi_payload("2000000"))
        .await;

    let reset = app
        .server
        .post("/api/signals/reset")
        .json(&json!({"signal_id": 1, "symbol": "ETH"}))
        .await;
    assert_eq!(reset.status_code(), 204);

    let states: Value = app.server.get("/api/signals/states").await.json();
    let states = states.as_object().expect("object body");
    assert!(states.contains_key("1:BTC"));
    assert!(!states.contains_key("1:ETH"));
}

#[tokio::test]
async fn signals_endpoint_lists_cached_definitions() {
    let app = TestApiServer::with_config(
        vec![pool(1, &["BTC"], &[1, 2])],
        vec![oi_above(2, 5.0), oi_above(1, 1.0)],
    )
    .await;

    let response = app.server.get("/api/signals").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let signals = body.as_array().expect("array body");
    assert_eq!(signals.len(), 2);
    // sorted by id regardless of store order
    assert_eq!(signals[0]["id"], 1);
    assert_eq!(signals[1]["id"], 2);
    assert_eq!(signals[0]["condition"]["metric"], "oi");
    assert_eq!(signals[0]["condition"]["operator"], ">");
}

#[tokio::test]
async fn pools_endpoint_lists_cached_pools() {
    let app = seeded_server().await;

    let response = app.server.get("/api/pools").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let pools = body.as_array().expect("array body");
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0]["name"], "pool-1");
    assert_eq!(pools[0]["symbols"], json!(["BTC"]));
    assert_eq!(pools[0]["signal_ids"], json!([1]));
}

#[tokio::test]
async fn triggers_are_persisted_through_the_sink() {
    let app = seeded_server().await;

    app.server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;

    let records = app.sink.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].signal_id, 1);
    assert_eq!(records[0].trigger_value, 1_100_000.0);
}

#[tokio::test]
async fn repeated_detects_keep_the_edge_held_without_refiring() {
    let app = seeded_server().await;

    let first = app
        .server
        .post("/api/detect/BTC")
        .json(&oi_payload("1100000"))
        .await;
    assert_eq!(first.json::<Value>().as_array().map(Vec::len), Some(1));

    // condition keeps holding across a burst of updates; the edge fires once
    for i in 0..10 {
        let oi = if i % 2 == 0 { "1150000" } else { "1250000" };
        let response = app
            .server
            .post("/api/detect/BTC")
            .json(&oi_payload(oi))
            .await;
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.json::<Value>().as_array().map(Vec::len), Some(0));
    }

    // state keeps tracking the held condition, and only one record was persisted
    let states: Value = app.server.get("/api/signals/states").await.json();
    assert_eq!(states["1:BTC"]["is_active"], true);
    assert_eq!(states["1:BTC"]["last_value"], 1_250_000.0);
    assert_eq!(app.sink.records().await.len(), 1);
}
