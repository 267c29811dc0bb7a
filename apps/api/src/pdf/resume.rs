//! Resume text extraction from uploaded files (PDF or plain text).

use crate::pdf::PdfError;

/// True when the content type or the leading bytes say PDF.
pub fn is_pdf(content_type: Option<&str>, head: &[u8]) -> bool {
    let ct = content_type.unwrap_or("").to_ascii_lowercase();
    ct.contains("application/pdf") || head.starts_with(b"%PDF-")
}

/// Returns the resume as text. PDFs go through `pdf-extract`; anything else
/// must be valid UTF-8.
pub fn extract_resume_text(bytes: &[u8], content_type: Option<&str>) -> Result<String, PdfError> {
    let text = if is_pdf(content_type, bytes) {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| PdfError::Extract(e.to_string()))?
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| PdfError::Extract("resume is neither a PDF nor UTF-8 text".to_string()))?
    };

    let text = normalize_whitespace(&text);
    if text.is_empty() {
        return Err(PdfError::Extract("resume contains no text".to_string()));
    }
    Ok(text)
}

/// Trims each line and collapses runs of blank lines to one.
fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(if line.trim().is_empty() { "" } else { line });
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
