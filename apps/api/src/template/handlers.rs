//! Axum route handlers for the Template API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::template::Template;
use crate::state::AppState;
use crate::template::store::{StoredTemplate, TemplateSummary};
use crate::template::validation::validate;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub template_id: Uuid,
    pub version: u32,
    pub schema: Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/templates
///
/// Validates and registers a template (upsert by id). Any cached plans for
/// the id are invalidated so a superseded version cannot linger.
pub async fn handle_register(
    State(state): State<AppState>,
    Json(template): Json<Template>,
) -> Result<Json<StoredTemplate>, AppError> {
    validate(&template)?;

    let stored = state.templates.upsert(template).await;
    state.plans.invalidate(stored.template.id).await;

    info!(
        template_id = %stored.template.id,
        version = stored.template.version,
        "registered template"
    );
    Ok(Json(stored))
}

/// POST /api/v1/templates/validate
///
/// Runs the validator only — nothing is registered. Lets authoring tools
/// surface structural errors before committing a template.
pub async fn handle_validate(
    Json(template): Json<Template>,
) -> Result<Json<ValidateResponse>, AppError> {
    validate(&template)?;
    Ok(Json(ValidateResponse { valid: true }))
}

/// GET /api/v1/templates
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateSummary>>, AppError> {
    Ok(Json(state.templates.list().await))
}

/// GET /api/v1/templates/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Template>, AppError> {
    state
        .templates
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))
}

/// DELETE /api/v1/templates/:id
///
/// Removes the template and every cached plan for it, regardless of version.
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.templates.remove(id).await {
        return Err(AppError::NotFound(format!("Template {id} not found")));
    }
    state.plans.invalidate(id).await;

    info!(template_id = %id, "deleted template");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// GET /api/v1/templates/:id/schema
///
/// Returns the compiled schema document for the registered template —
/// a preview of exactly what the generation backend will be constrained
/// by. Compiles through the plan cache, so a later run reuses the plan.
pub async fn handle_schema(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SchemaResponse>, AppError> {
    let template = state
        .templates
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;

    let plan = state.plans.get_or_compile(&template).await?;

    Ok(Json(SchemaResponse {
        template_id: plan.template_id,
        version: plan.version,
        schema: plan.schema_json(),
    }))
}
