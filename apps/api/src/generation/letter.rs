//! Plain-text cover letter assembly and the recipient details shared with the
//! PDF form.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::generation::generator::CoverLetterContent;
use crate::generation::sections::{
    CULTURE_FIT, HOOK_INSIGHT, QUANTIFIABLE_ACHIEVEMENT, SKILL_ALIGNMENT,
};

/// Body paragraphs in reading order.
const BODY_ORDER: [&str; 4] = [HOOK_INSIGHT, SKILL_ALIGNMENT, QUANTIFIABLE_ACHIEVEMENT, CULTURE_FIT];

const GREETING: &str = "Dear Hiring Manager,";
const CLOSING: &str = "Sincerely,";

/// Recipient details typed in by the user rather than generated.
/// Field names match the letter template's AcroForm fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LetterDetails {
    pub company_name: String,
    #[serde(default)]
    pub company_address: Option<String>,
    pub job_title: String,
    #[serde(default)]
    pub signature_name: Option<String>,
}

impl LetterDetails {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.company_name.trim().is_empty() {
            return Err(AppError::Validation(
                "company_name cannot be empty".to_string(),
            ));
        }
        if self.job_title.trim().is_empty() {
            return Err(AppError::Validation("job_title cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Form field values for the recipient fields of the letter template.
    /// The template carries its own date and signature.
    pub fn form_fields(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert("company_name".to_string(), self.company_name.clone());
        fields.insert("job_title".to_string(), self.job_title.clone());
        if let Some(address) = &self.company_address {
            fields.insert("company_address".to_string(), address.clone());
        }
        fields
    }
}

/// e.g. "October 19, 2026"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Assembles the full letter as plain text, ready to paste into an editor.
pub fn compose_plain_text(
    details: &LetterDetails,
    content: &CoverLetterContent,
    date: NaiveDate,
) -> String {
    let mut blocks: Vec<String> = Vec::new();

    blocks.push(format_date(date));

    let mut recipient = vec![details.company_name.trim().to_string()];
    if let Some(address) = details
        .company_address
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        recipient.push(address.to_string());
    }
    blocks.push(recipient.join("\n"));

    blocks.push(format!("Re: {}", details.job_title.trim()));
    blocks.push(GREETING.to_string());

    blocks.extend(
        BODY_ORDER
            .iter()
            .filter_map(|name| content.sections.get(*name))
            .cloned(),
    );

    match details.signature_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => blocks.push(format!("{CLOSING}\n{name}")),
        _ => blocks.push(CLOSING.to_string()),
    }

    let mut letter = blocks.join("\n\n");
    letter.push('\n');
    letter
}
