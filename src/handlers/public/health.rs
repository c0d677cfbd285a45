use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Redirect},
};
use serde_json::json;

use crate::middleware::guard::DEFAULT_CALLBACK;
use crate::state::AppState;

/// GET / - the dashboard is the home page
pub async fn root() -> Redirect {
    Redirect::to(DEFAULT_CALLBACK)
}

/// GET /health - liveness plus database reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let version = env!("CARGO_PKG_VERSION");

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "version": version,
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "version": version,
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}
