//! Health check endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::api::server::AppState;

/// Health check endpoint.
///
/// Returns `503` while the item store cannot serve requests.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, health, store) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy", "ok"),
        Err(e) => {
            warn!(error = %e, "Item store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "unavailable")
        }
    };

    (
        status,
        Json(json!({
            "status": health,
            "service": "itemcast",
            "store": store,
            "connections": state.broadcaster.active_count(),
            "uptime_secs": state.started_at.elapsed().as_secs(),
        })),
    )
}
