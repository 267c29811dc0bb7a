use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::template::TemplateError;
use crate::pdf::PdfError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// The LLM response did not contain every tagged section.
    #[error("Failed to parse sections: {}", .missing.join(", "))]
    MissingSections {
        missing: Vec<String>,
        raw_response: String,
    },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Template(e) => (StatusCode::BAD_REQUEST, "TEMPLATE_ERROR", e.to_string()),
            AppError::MissingSections {
                missing,
                raw_response,
            } => {
                let body = Json(json!({
                    "error": {
                        "code": "MISSING_SECTIONS",
                        "message": self.to_string(),
                        "missing": missing,
                        "raw_response": raw_response,
                    }
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "The text generation backend failed".to_string(),
                )
            }
            AppError::Pdf(e) => {
                tracing::error!("PDF error: {e}");
                let message = match e {
                    PdfError::MissingFields(_) => e.to_string(),
                    _ => "A PDF processing error occurred".to_string(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, "PDF_ERROR", message)
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
