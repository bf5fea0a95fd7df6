#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::compiler::plan::DecodeError;
use crate::compiler::schema::CompileError;
use crate::execution::RunError;
use crate::template::validation::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Template validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Schema compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("Run failed: {0}")]
    Run(#[from] RunError),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the caller may retry the same request unchanged. Mirrors
    /// the per-kind classification of the underlying errors.
    fn is_retryable(&self) -> bool {
        match self {
            AppError::Run(e) => e.is_retryable(),
            AppError::Unavailable(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                e.to_string(),
            ),
            AppError::Compile(e) => {
                tracing::error!("Compile error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPILE_ERROR",
                    e.to_string(),
                )
            }
            AppError::Run(RunError::Decode(e)) => {
                tracing::error!("Decode error: {e}");
                (StatusCode::BAD_GATEWAY, "DECODE_ERROR", e.to_string())
            }
            AppError::Run(RunError::Generation(e)) => {
                tracing::error!("Generation error: {e}");
                (StatusCode::BAD_GATEWAY, "GENERATION_ERROR", e.to_string())
            }
            AppError::Unavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "BACKEND_UNAVAILABLE",
                reason.clone(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}
