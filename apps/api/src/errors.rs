use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::LlmError;
use crate::schema::ValidationError;

/// Errors from one task execution attempt. The engine inspects these to
/// decide whether another attempt is worthwhile.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Model returned empty output")]
    EmptyModelOutput,

    #[error("Model output is not valid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Model output failed contract validation: {0}")]
    SchemaValidation(#[from] ValidationError),

    #[error("Tailored resume is not usable even after repair")]
    IncompleteResume,

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Failed to persist task result: {0}")]
    Persistence(String),

    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Task(TaskError::MissingInput(msg)) => (
                StatusCode::BAD_REQUEST,
                "MISSING_INPUT",
                format!("Missing input: {msg}"),
            ),
            AppError::Task(TaskError::Persistence(msg)) => {
                tracing::error!("Persistence error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CACHE_ERROR",
                    "A cache error occurred".to_string(),
                )
            }
            AppError::Task(e) => {
                tracing::error!("Task error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "TASK_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Cache(msg) => {
                tracing::error!("Cache error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CACHE_ERROR",
                    "A cache error occurred".to_string(),
                )
            }
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
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
