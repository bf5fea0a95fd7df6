pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::execution::handlers as run_handlers;
use crate::state::AppState;
use crate::template::handlers as template_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Template API
        .route(
            "/api/v1/templates",
            get(template_handlers::handle_list).post(template_handlers::handle_register),
        )
        .route(
            "/api/v1/templates/validate",
            post(template_handlers::handle_validate),
        )
        .route(
            "/api/v1/templates/:id",
            get(template_handlers::handle_get).delete(template_handlers::handle_delete),
        )
        .route(
            "/api/v1/templates/:id/schema",
            get(template_handlers::handle_schema),
        )
        // Run API
        .route("/api/v1/templates/:id/run", post(run_handlers::handle_run))
        .with_state(state)
}
