use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::error::AnalysisError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No AI provider is configured")]
    NotConfigured,

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Analysis(e) => match e {
                AnalysisError::InvalidInput(_) | AnalysisError::ExtractionFailed(_) => {
                    StatusCode::BAD_REQUEST
                }
                AnalysisError::AlreadyInProgress | AnalysisError::Abandoned => StatusCode::CONFLICT,
                AnalysisError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AnalysisError::RequestFailed(_) => StatusCode::BAD_GATEWAY,
                AnalysisError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            },
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::NotConfigured => (
                "NOT_CONFIGURED",
                "Add an AI provider key in Settings before running an analysis".to_string(),
            ),
            AppError::Analysis(e) => {
                tracing::warn!("Analysis error: {e}");
                (e.code(), e.user_message())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                ("DATABASE_ERROR", "A database error occurred".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
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
