//! REST API module using Axum
//!
//! Exposes the incident pipeline over HTTP:
//! - `/api/v1` routes for health, stats, inventory and incident submission
//! - `/health` at root level for load balancers
//!
//! Incident traces are streamed as Server-Sent Events, one event per trace
//! event, as they are produced.

mod error;
pub mod handlers;
mod routes;

pub use error::ApiError;
pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Same-origin by default.
///
/// Set `SENTINEL_CORS_ORIGINS` to a comma-separated list of allowed origins
/// to open the API to a separately hosted console.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match std::env::var("SENTINEL_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::root_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
