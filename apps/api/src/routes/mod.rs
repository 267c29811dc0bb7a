pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::pdf::handlers as pdf_handlers;
use crate::state::AppState;

/// Resume uploads may exceed axum's 2 MB default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Core: prompt rendering and section extraction
        .route("/api/v1/prompts/render", post(handlers::handle_render_prompt))
        .route(
            "/api/v1/sections/extract",
            post(handlers::handle_extract_sections),
        )
        // Cover letter pipeline
        .route(
            "/api/v1/cover-letters/generate",
            post(handlers::handle_generate),
        )
        .route(
            "/api/v1/cover-letters/text",
            post(handlers::handle_generate_text),
        )
        .route(
            "/api/v1/cover-letters/pdf",
            post(handlers::handle_generate_pdf),
        )
        // PDF collaborators
        .route(
            "/api/v1/resumes/extract-text",
            post(pdf_handlers::handle_extract_resume_text),
        )
        .route(
            "/api/v1/templates/fields",
            get(pdf_handlers::handle_template_fields),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
