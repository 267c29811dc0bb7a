use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::pdf::form::FormField;
use crate::pdf::{extract_resume_text, list_form_fields};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ResumeTextResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateFieldsResponse {
    pub fields: Vec<FormField>,
}

/// POST /api/v1/resumes/extract-text
///
/// Multipart upload (`file`) of a PDF or plain-text resume; returns its text.
pub async fn handle_extract_resume_text(
    mut multipart: Multipart,
) -> Result<Json<ResumeTextResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let text = tokio::task::spawn_blocking(move || {
            extract_resume_text(&bytes, content_type.as_deref())
        })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Resume extraction task failed: {e}")))?
        .map_err(|e| AppError::Validation(e.to_string()))?;

        return Ok(Json(ResumeTextResponse { text }));
    }

    Err(AppError::Validation(format!(
        "multipart field '{UPLOAD_FIELD}' is required"
    )))
}

/// GET /api/v1/templates/fields
///
/// Lists the AcroForm fields of the configured letter template, so field
/// names can be checked against the section names.
pub async fn handle_template_fields(
    State(state): State<AppState>,
) -> Result<Json<TemplateFieldsResponse>, AppError> {
    let template = state.form_template.clone().ok_or_else(|| {
        AppError::NotFound("No form template configured (set FORM_TEMPLATE_PATH)".to_string())
    })?;

    let fields = tokio::task::spawn_blocking(move || list_form_fields(&template))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Field listing task failed: {e}")))??;

    Ok(Json(TemplateFieldsResponse { fields }))
}
