//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use sentinel::agents::IncidentOrchestrator;
use sentinel::api::{create_app, ApiState};
use sentinel::capabilities::{InMemoryMemoryBank, ResourceStore, StaticWeatherService};
use sentinel::config::SentinelConfig;
use sentinel::storage::InMemoryResourceStore;
use sentinel::trace::FixedClock;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_state() -> ApiState {
    let config = SentinelConfig::default();
    let store: Arc<dyn ResourceStore> =
        Arc::new(InMemoryResourceStore::from_records(config.inventory.records()));
    let orchestrator = IncidentOrchestrator::from_config(
        &config,
        store.clone(),
        Arc::new(InMemoryMemoryBank::from_entries(config.strategy.memory.clone())),
        Arc::new(StaticWeatherService::new(config.weather.advisories.clone())),
        Arc::new(FixedClock::epoch()),
    );
    ApiState::new(orchestrator, store)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn submit(headline: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/incidents")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "headline": headline }).to_string()))
        .unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
}

/// SSE `data:` payloads in order
fn sse_payloads(body: &str) -> Vec<serde_json::Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter_map(|data| serde_json::from_str(data).ok())
        .collect()
}

/// All GET endpoints should return 200.
#[tokio::test]
async fn test_get_endpoints_return_200() {
    let endpoints = [
        "/health",
        "/api/v1/health",
        "/api/v1/stats",
        "/api/v1/inventory/US_East_Coast",
    ];

    for endpoint in &endpoints {
        let app = create_app(create_test_state());
        let resp = app.oneshot(get(endpoint)).await.unwrap();

        assert!(
            resp.status().is_success(),
            "GET {endpoint} returned status {}",
            resp.status()
        );
    }
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v2/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_incident_streams_trace_as_sse() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(submit("BREAKING: Major labor strike declared at Hamburg Port."))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/event-stream"));

    let body = body_string(resp).await;
    assert!(body.contains("event: tool_call"));
    assert!(body.contains("event: memory_recall"));
    assert!(body.contains("event: terminal"));

    let payloads = sse_payloads(&body);
    assert_eq!(payloads[0]["kind"], "log");
    let last = payloads.last().unwrap();
    assert_eq!(last["kind"], "terminal");
    assert_eq!(last["outcome"], "complete_executed");
}

#[tokio::test]
async fn test_incident_updates_inventory_and_stats() {
    let state = create_test_state();

    let resp = create_app(state.clone())
        .oneshot(submit("Hamburg Strike"))
        .await
        .unwrap();
    // Drain so the run finishes
    let _ = body_string(resp).await;

    let resp = create_app(state.clone())
        .oneshot(get("/api/v1/inventory/Hamburg_Port"))
        .await
        .unwrap();
    let record = body_json(resp).await;
    assert_eq!(record["stock"]["Automotive Parts"], "IN TRANSIT - REROUTED");
    assert_eq!(record["stock"]["Steel"], "IN STOCK");

    let resp = create_app(state).oneshot(get("/api/v1/stats")).await.unwrap();
    let stats = body_json(resp).await;
    assert_eq!(stats["started"], 1);
    assert_eq!(stats["complete_executed"], 1);
    assert_eq!(stats["cancelled"], 0);
}

#[tokio::test]
async fn test_clear_incident_ends_with_clear_terminal() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(submit("Local bake sale happening in Ohio."))
        .await
        .unwrap();

    let payloads = sse_payloads(&body_string(resp).await);
    assert_eq!(payloads.last().unwrap()["outcome"], "complete_clear");
    assert!(payloads.iter().all(|p| p["stage"] != "strategy"));
}

#[tokio::test]
async fn test_incident_headline_is_recorded_verbatim() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(submit("  Hamburg Strike\t")).await.unwrap();

    let payloads = sse_payloads(&body_string(resp).await);
    assert_eq!(payloads[0]["message"], "🔵 Incoming News: \"  Hamburg Strike\t\"");
    assert_eq!(payloads.last().unwrap()["outcome"], "complete_executed");
}

#[tokio::test]
async fn test_malformed_incident_body_is_client_error() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/incidents")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title": "no headline field"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_unknown_inventory_region_returns_error_envelope() {
    let app = create_app(create_test_state());
    let resp = app.oneshot(get("/api/v1/inventory/Atlantis")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "NOT_FOUND");
}
