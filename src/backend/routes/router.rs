/**
 * Router Configuration
 *
 * The main router creation function combining all routes into a single
 * Axum router.
 *
 * # Routes
 *
 * - `GET /ws/{doc_id}` - WebSocket control channel, one per user
 * - `GET /healthz`     - liveness probe
 * - `GET /status`      - JSON summary: documents, sessions, uptime
 *
 * All routes run under a `tower_http` trace layer.
 */
use axum::extract::State;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::backend::realtime::ws::ws_handler;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured.
pub fn create_router(app_state: AppState) -> Router<()> {
    Router::new()
        .route("/ws/{doc_id}", axum::routing::get(ws_handler))
        .route("/healthz", axum::routing::get(healthz))
        .route("/status", axum::routing::get(status))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Liveness probe.
async fn healthz() -> &'static str {
    "ok"
}

/// Server summary for dashboards and debugging.
async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let documents = state.documents.document_count().await;
    let sessions = state.documents.session_count().await;
    Json(serde_json::json!({
        "documents": documents,
        "sessions": sessions,
        "uptime_seconds": state.uptime_seconds(),
        "started_at": state.started_at.to_rfc3339(),
    }))
}
