//! Axum route handlers for the Run API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::Availability;
use crate::models::output::OutputGroup;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    /// Free-text input. Absent input falls back to the template's
    /// `exampleInput` so authors can dry-run a template as saved.
    pub input: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub template_id: Uuid,
    pub version: u32,
    pub groups: Vec<OutputGroup>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/templates/:id/run
///
/// Full run pipeline: availability check → plan from cache (compile on
/// miss) → guided generation → decode. Returns groups in the template's
/// declared order.
pub async fn handle_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, AppError> {
    let template = state
        .templates
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    // Surface a not-ready backend as 503 up front, not as a failed run.
    if let Availability::Unavailable(reason) = state.backend.availability() {
        return Err(AppError::Unavailable(reason));
    }

    let input = request
        .input
        .or_else(|| template.example_input.clone())
        .ok_or_else(|| {
            AppError::BadRequest(
                "input is required (template has no exampleInput to fall back to)".to_string(),
            )
        })?;
    if input.trim().is_empty() {
        return Err(AppError::BadRequest("input cannot be empty".to_string()));
    }

    let plan = state.plans.get_or_compile(&template).await?;

    info!(
        template_id = %plan.template_id,
        version = plan.version,
        "starting run"
    );
    let groups = state.runner.run(&plan, &input).await?;

    Ok(Json(RunResponse {
        template_id: plan.template_id,
        version: plan.version,
        groups,
    }))
}
