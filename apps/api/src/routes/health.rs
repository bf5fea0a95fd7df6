use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::llm_client::Availability;
use crate::state::AppState;

/// GET /health
/// Returns service status plus the generation backend's readiness.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let backend = match state.backend.availability() {
        Availability::Ready => json!({ "status": "ready" }),
        Availability::Unavailable(reason) => {
            json!({ "status": "unavailable", "reason": reason })
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "prism-api",
        "backend": backend
    }))
}
