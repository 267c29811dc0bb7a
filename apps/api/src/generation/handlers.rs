//! Axum route handlers for the Generation API.

use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::generation::generator::{
    form_field_values, generate_cover_letter, CoverLetterContent, GenerateRequest,
};
use crate::generation::letter::{compose_plain_text, LetterDetails};
use crate::generation::sections::{extract_sections, CompleteSections};
use crate::generation::template::{render, Substitutions};
use crate::pdf::{fill_form, PdfError};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RenderPromptResponse {
    pub prompt: String,
}

/// Generation inputs plus an optional template to try instead of the
/// configured one.
#[derive(Debug, Deserialize)]
pub struct RenderPromptRequest {
    #[serde(flatten)]
    pub request: GenerateRequest,
    pub template: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractSectionsRequest {
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractSectionsResponse {
    pub sections: BTreeMap<String, Option<String>>,
    pub missing: Vec<String>,
    pub complete: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub sections: CompleteSections,
}

/// Generation inputs plus the recipient details typed by the user.
#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    #[serde(flatten)]
    pub request: GenerateRequest,
    #[serde(flatten)]
    pub details: LetterDetails,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/prompts/render
///
/// Returns the exact prompt that would be sent to the backend. No LLM call.
/// A `template` in the body replaces the configured one for this call only.
pub async fn handle_render_prompt(
    State(state): State<AppState>,
    Json(body): Json<RenderPromptRequest>,
) -> Result<Json<RenderPromptResponse>, AppError> {
    let template = body.template.as_deref().unwrap_or(&*state.prompt_template);
    let prompt = render(
        template,
        &Substitutions {
            resume_text: &body.request.resume_text,
            job_desc_text: &body.request.job_desc_text,
        },
    )?;

    Ok(Json(RenderPromptResponse { prompt }))
}

/// POST /api/v1/sections/extract
///
/// Runs the section extractor over a pasted response. Useful for debugging
/// prompt changes without spending an LLM call.
pub async fn handle_extract_sections(
    State(state): State<AppState>,
    Json(request): Json<ExtractSectionsRequest>,
) -> Json<ExtractSectionsResponse> {
    let extraction = extract_sections(&request.raw_text, &state.section_spec);

    Json(ExtractSectionsResponse {
        complete: extraction.is_complete(),
        missing: extraction.missing().into_iter().map(String::from).collect(),
        sections: extraction
            .sections()
            .iter()
            .map(|s| (s.name.clone(), s.content.clone()))
            .collect(),
    })
}

/// POST /api/v1/cover-letters/generate
///
/// Full pipeline: render → generate → extract. 422 if any section is missing.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    request.validate()?;

    let content = run_pipeline(&state, &request).await?;

    Ok(Json(GenerateResponse {
        sections: content.sections,
    }))
}

/// POST /api/v1/cover-letters/text
///
/// Generates the sections and returns the whole letter as plain text.
pub async fn handle_generate_text(
    State(state): State<AppState>,
    Json(body): Json<CoverLetterRequest>,
) -> Result<Response, AppError> {
    body.request.validate()?;
    body.details.validate()?;

    let content = run_pipeline(&state, &body.request).await?;
    let letter = compose_plain_text(&body.details, &content, today());

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        letter,
    )
        .into_response())
}

/// POST /api/v1/cover-letters/pdf
///
/// Generates the sections and fills them, with the recipient details, into
/// the configured AcroForm template.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Json(body): Json<CoverLetterRequest>,
) -> Result<Response, AppError> {
    body.request.validate()?;
    body.details.validate()?;

    let template = state.form_template.clone().ok_or_else(|| {
        AppError::NotFound("No form template configured (set FORM_TEMPLATE_PATH)".to_string())
    })?;

    let content = run_pipeline(&state, &body.request).await?;
    let fields = form_field_values(&body.details.form_fields(), &content);

    let (pdf, report) = tokio::task::spawn_blocking(move || fill_form(&template, &fields))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF fill task failed: {e}")))??;

    // Generated paragraphs must all land in the form.
    let dropped: Vec<String> = report
        .unmatched
        .iter()
        .filter(|name| state.section_spec.sections().iter().any(|s| s.name == **name))
        .cloned()
        .collect();
    if !dropped.is_empty() {
        return Err(PdfError::MissingFields(dropped).into());
    }

    info!(
        "Filled cover letter PDF: {} fields, {} bytes",
        report.filled.len(),
        pdf.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"cover_letter.pdf\"",
            ),
        ],
        pdf,
    )
        .into_response())
}

async fn run_pipeline(
    state: &AppState,
    request: &GenerateRequest,
) -> Result<CoverLetterContent, AppError> {
    generate_cover_letter(
        state.generator.as_ref(),
        &state.prompt_template,
        &state.section_spec,
        request,
    )
    .await
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
