//! API route definitions
//!
//! - /api/v1/health - liveness and store backend
//! - /api/v1/stats - run counters per outcome
//! - /api/v1/inventory/:region - current resource record
//! - /api/v1/incidents - submit a headline, stream the trace

use axum::{routing::{get, post}, Router};

use super::handlers::{self, ApiState};

/// Versioned API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/stats", get(handlers::get_stats))
        .route("/inventory/:region", get(handlers::get_inventory))
        .route("/incidents", post(handlers::post_incident))
        .with_state(state)
}

/// Health endpoint at root level
pub fn root_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::IncidentOrchestrator;
    use crate::capabilities::{InMemoryMemoryBank, ResourceStore, StaticWeatherService};
    use crate::config::SentinelConfig;
    use crate::storage::InMemoryResourceStore;
    use crate::trace::FixedClock;
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

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_api_routes_health() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["status"], "ok");
        assert_eq!(v["store_backend"], "InMemory");
    }

    #[tokio::test]
    async fn test_api_routes_inventory() {
        let app = api_routes(create_test_state());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/inventory/Hamburg_Port")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let v = body_json(response).await;
        assert_eq!(v["warehouse_id"], "WH-HAM-99");
        assert_eq!(v["stock"]["Steel"], "IN STOCK");

        let missing = app
            .oneshot(Request::builder().uri("/inventory/Tokyo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_routes_incident_rejects_blank_headline() {
        let app = api_routes(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/incidents")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"headline":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
