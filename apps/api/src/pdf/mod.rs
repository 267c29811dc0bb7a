// PDF collaborators: AcroForm filling for the letter template and text
// extraction for uploaded resumes. Both are CPU-bound and are called from
// handlers via tokio::task::spawn_blocking.

pub mod form;
pub mod handlers;
pub mod resume;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Invalid PDF structure: {0}")]
    Structure(#[from] lopdf::Error),

    #[error("PDF has no AcroForm")]
    NoAcroForm,

    #[error("Failed to extract text: {0}")]
    Extract(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error("Form template has no field for: {}", .0.join(", "))]
    MissingFields(Vec<String>),
}

pub use form::{fill_form, list_form_fields, FillReport};
pub use resume::extract_resume_text;
