//! Cover letter generation: orchestrates the full pipeline.
//!
//! Flow: render prompt → TextGenerator → extract sections → missing-section
//! check. A response that is missing any section stops the pipeline; there is
//! no regeneration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::generation::sections::{extract_sections, CompleteSections, SectionSpec};
use crate::generation::template::{render, Substitutions};
use crate::llm_client::TextGenerator;

/// Characters of each section shown in the debug preview.
const PREVIEW_CHARS: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body shared by every generation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub resume_text: String,
    pub job_desc_text: String,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.resume_text.trim().is_empty() {
            return Err(AppError::Validation(
                "resume_text cannot be empty".to_string(),
            ));
        }
        if self.job_desc_text.trim().is_empty() {
            return Err(AppError::Validation(
                "job_desc_text cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// The four generated paragraphs, keyed by section / form field name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverLetterContent {
    pub sections: CompleteSections,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs render → generate → extract and returns every section, or
/// `AppError::MissingSections` naming the ones the response lacked.
pub async fn generate_cover_letter(
    generator: &dyn TextGenerator,
    template: &str,
    spec: &SectionSpec,
    request: &GenerateRequest,
) -> Result<CoverLetterContent, AppError> {
    let prompt = render(
        template,
        &Substitutions {
            resume_text: &request.resume_text,
            job_desc_text: &request.job_desc_text,
        },
    )?;
    info!("Generating cover letter content ({} prompt chars)", prompt.len());

    let raw_response = generator
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Cover letter generation failed: {e}")))?;
    info!("Received {} response chars", raw_response.len());

    let extraction = extract_sections(&raw_response, spec);
    for section in spec.sections() {
        if let Some(text) = extraction.get(&section.name) {
            debug!("{}: {}", section.name, preview(text));
        }
    }

    let sections = match extraction.into_complete() {
        Ok(sections) => sections,
        Err(missing) => {
            warn!("{missing}");
            debug!("Raw LLM response: {raw_response}");
            return Err(AppError::MissingSections {
                missing: missing.missing,
                raw_response,
            });
        }
    };

    Ok(CoverLetterContent { sections })
}

/// First `PREVIEW_CHARS` characters, with an ellipsis when truncated.
fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

/// Merges letter details and generated sections into one field map for the form.
pub fn form_field_values(
    details: &BTreeMap<String, String>,
    content: &CoverLetterContent,
) -> BTreeMap<String, String> {
    details
        .iter()
        .chain(content.sections.iter())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
