//! Prompt Renderer: fills the master prompt template with resume and JD text.
//!
//! The template is loaded from a configuration file at startup. Only two
//! placeholders are recognised; every other brace is emitted untouched.

use thiserror::Error;

/// Placeholder replaced with the candidate's resume text.
pub const RESUME_PLACEHOLDER: &str = "{resume_text}";
/// Placeholder replaced with the job description text.
pub const JOB_DESC_PLACEHOLDER: &str = "{job_desc_text}";

const PLACEHOLDERS: [&str; 2] = [RESUME_PLACEHOLDER, JOB_DESC_PLACEHOLDER];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Prompt template is missing required placeholder(s): {}", .0.join(", "))]
    MissingPlaceholders(Vec<&'static str>),
}

/// The two free-text values substituted into the template.
#[derive(Debug, Clone, Copy)]
pub struct Substitutions<'a> {
    pub resume_text: &'a str,
    pub job_desc_text: &'a str,
}

impl<'a> Substitutions<'a> {
    fn value_for(&self, placeholder: &str) -> &'a str {
        if placeholder == RESUME_PLACEHOLDER {
            self.resume_text
        } else {
            self.job_desc_text
        }
    }
}

/// Checks that both placeholders are present. Run once at startup so a
/// broken template file fails before the first request.
pub fn validate_template(template: &str) -> Result<(), TemplateError> {
    let missing: Vec<&'static str> = PLACEHOLDERS
        .into_iter()
        .filter(|p| !template.contains(*p))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(TemplateError::MissingPlaceholders(missing))
    }
}

/// Substitutes every placeholder occurrence in a single left-to-right pass.
///
/// Values are inserted verbatim and never re-scanned, so a resume that
/// happens to contain `{job_desc_text}` is emitted as written.
pub fn render(template: &str, subs: &Substitutions<'_>) -> Result<String, TemplateError> {
    validate_template(template)?;

    let mut out = String::with_capacity(
        template.len() + subs.resume_text.len() + subs.job_desc_text.len(),
    );
    let mut rest = template;

    while let Some((pos, placeholder)) = next_placeholder(rest) {
        out.push_str(&rest[..pos]);
        out.push_str(subs.value_for(placeholder));
        rest = &rest[pos + placeholder.len()..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Earliest placeholder occurrence in `text`, if any.
fn next_placeholder(text: &str) -> Option<(usize, &'static str)> {
    PLACEHOLDERS
        .into_iter()
        .filter_map(|p| text.find(p).map(|pos| (pos, p)))
        .min_by_key(|(pos, _)| *pos)
}
