//! API route handlers
//!
//! - health and run statistics
//! - resource-store inspection by region
//! - incident submission, answered with a Server-Sent-Events trace

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::error::ApiError;
use crate::agents::{IncidentOrchestrator, StatsSnapshot};
use crate::capabilities::ResourceStore;
use crate::config::defaults;
use crate::types::{RegionRecord, TraceEvent};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: IncidentOrchestrator,
    /// Same store the orchestrator's Execution stage mutates
    pub store: Arc<dyn ResourceStore>,
}

impl ApiState {
    pub fn new(orchestrator: IncidentOrchestrator, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            orchestrator,
            store,
        }
    }
}

// ============================================================================
// Health & Stats
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store_backend: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /health, GET /api/v1/health
pub async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store_backend: state.store.backend_name(),
        timestamp: Utc::now(),
    })
}

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<ApiState>) -> Json<StatsSnapshot> {
    Json(state.orchestrator.stats())
}

// ============================================================================
// Inventory
// ============================================================================

/// GET /api/v1/inventory/:region
pub async fn get_inventory(
    State(state): State<ApiState>,
    Path(region): Path<String>,
) -> Result<Json<RegionRecord>, ApiError> {
    match state.store.get(&region).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::NotFound(format!("no resource record for region `{}`", region))),
    }
}

// ============================================================================
// Incidents
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IncidentRequest {
    pub headline: String,
}

/// POST /api/v1/incidents
///
/// One SSE event per trace event: `event:` carries the kind, `data:` the
/// JSON-encoded event. The stream ends after the Terminal event. A client
/// disconnect drops the trace stream, which cancels the run.
pub async fn post_incident(
    State(state): State<ApiState>,
    Json(request): Json<IncidentRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    if request.headline.trim().is_empty() {
        return Err(ApiError::BadRequest("headline must not be empty".to_string()));
    }

    info!(headline = %request.headline, "Incident submitted");
    let stream = state
        .orchestrator
        .run(request.headline)
        .map(|event| Ok(to_sse(&event)));

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(defaults::SSE_KEEPALIVE_SECS))
            .text("ping"),
    ))
}

fn to_sse(event: &TraceEvent) -> Event {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(kind = event.kind.as_str(), error = %e, "Failed to encode trace event");
            String::new()
        }
    };
    Event::default().event(event.kind.as_str()).data(json)
}
