//! Section Extractor: pulls tag-delimited sections out of a raw LLM response.
//!
//! Each section is located independently:
//! 1. first occurrence of the start tag
//! 2. first occurrence of the end tag, searched over the WHOLE text
//! 3. the text strictly between the two, trimmed
//!
//! A section is absent when either tag is missing, when the end tag begins
//! before the start tag ends, or when the trimmed content is empty.
//! Absent sections are reported by `Extraction::missing()` and block
//! document assembly.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Section definitions
// ────────────────────────────────────────────────────────────────────────────

/// One named section and the markers that delimit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub name: String,
    pub start_tag: String,
    pub end_tag: String,
}

impl Section {
    pub fn new(
        name: impl Into<String>,
        start_tag: impl Into<String>,
        end_tag: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_tag: start_tag.into(),
            end_tag: end_tag.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionSpecError {
    #[error("Duplicate section name: {0}")]
    DuplicateName(String),

    #[error("Tag '{0}' is used by more than one section")]
    DuplicateTag(String),

    #[error("Section '{0}' has an empty tag")]
    EmptyTag(String),
}

/// Ordered list of sections. Names and tags are unique across the spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSpec {
    sections: Vec<Section>,
}

impl SectionSpec {
    pub fn new(sections: Vec<Section>) -> Result<Self, SectionSpecError> {
        let mut names = HashSet::new();
        let mut tags = HashSet::new();

        for section in &sections {
            if !names.insert(section.name.as_str()) {
                return Err(SectionSpecError::DuplicateName(section.name.clone()));
            }
            for tag in [&section.start_tag, &section.end_tag] {
                if tag.is_empty() {
                    return Err(SectionSpecError::EmptyTag(section.name.clone()));
                }
                if !tags.insert(tag.as_str()) {
                    return Err(SectionSpecError::DuplicateTag(tag.clone()));
                }
            }
        }

        Ok(Self { sections })
    }

    /// The four cover-letter sections requested by the master prompt.
    /// Names match the AcroForm field names of the letter template.
    pub fn cover_letter() -> Result<Self, SectionSpecError> {
        Self::new(vec![
            Section::new(HOOK_INSIGHT, "[HOOK_INSIGHT_START]", "[HOOK_INSIGHT_END]"),
            Section::new(
                SKILL_ALIGNMENT,
                "[SKILL_ALIGNMENT_START]",
                "[SKILL_ALIGNMENT_END]",
            ),
            Section::new(
                QUANTIFIABLE_ACHIEVEMENT,
                "[QUANTIFIABLE_ACHIEVEMENT_START]",
                "[QUANTIFIABLE_ACHIEVEMENT_END]",
            ),
            Section::new(CULTURE_FIT, "[CULTURE_FIT_START]", "[CULTURE_FIT_END]"),
        ])
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

pub const HOOK_INSIGHT: &str = "ai_hook_insight";
pub const SKILL_ALIGNMENT: &str = "ai_skill_alignment_paragraph";
pub const QUANTIFIABLE_ACHIEVEMENT: &str = "ai_quantifiable_achievement_paragraph";
pub const CULTURE_FIT: &str = "ai_culture_fit_paragraph";

// ────────────────────────────────────────────────────────────────────────────
// Extraction result
// ────────────────────────────────────────────────────────────────────────────

/// A single section outcome. `content == None` is the absence marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedSection {
    pub name: String,
    pub content: Option<String>,
}

/// Result of one extraction pass, in spec order. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    sections: Vec<ExtractedSection>,
}

/// Every section was found.
pub type CompleteSections = BTreeMap<String, String>;

/// One or more sections could not be located in the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to parse sections: {}", .missing.join(", "))]
pub struct MissingSections {
    pub missing: Vec<String>,
}

impl Extraction {
    pub fn sections(&self) -> &[ExtractedSection] {
        &self.sections
    }

    /// Content of a named section. `None` for both unknown and absent names.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.content.as_deref())
    }

    /// Names whose content is absent, in spec order.
    pub fn missing(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| s.content.is_none())
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(|s| s.content.is_some())
    }

    /// Converts into a name → text map, or reports which sections are missing.
    pub fn into_complete(self) -> Result<CompleteSections, MissingSections> {
        let missing: Vec<String> = self.missing().into_iter().map(String::from).collect();
        if !missing.is_empty() {
            return Err(MissingSections { missing });
        }

        Ok(self
            .sections
            .into_iter()
            .filter_map(|s| s.content.map(|c| (s.name, c)))
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

/// Runs a single deterministic pass over `raw_text` for every section in `spec`.
pub fn extract_sections(raw_text: &str, spec: &SectionSpec) -> Extraction {
    let sections = spec
        .sections
        .iter()
        .map(|section| ExtractedSection {
            name: section.name.clone(),
            content: extract_between(raw_text, &section.start_tag, &section.end_tag)
                .map(String::from),
        })
        .collect();

    Extraction { sections }
}

/// Text strictly between the first `start_tag` and the first `end_tag`, trimmed.
///
/// The end tag is searched over the entire text, not just after the start
/// tag. An end tag that begins before the start tag's content is treated as
/// absent rather than producing a reversed slice.
pub fn extract_between<'a>(text: &'a str, start_tag: &str, end_tag: &str) -> Option<&'a str> {
    let content_start = text.find(start_tag)? + start_tag.len();
    let content_end = text.find(end_tag)?;

    if content_end < content_start {
        return None;
    }

    let content = text[content_start..content_end].trim();
    if content.is_empty() {
        None
    } else {
        Some(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_a() -> SectionSpec {
        SectionSpec::new(vec![Section::new("a", "[A_START]", "[A_END]")]).unwrap()
    }

    const FULL_RESPONSE: &str = "Here is your content.\n\
        [HOOK_INSIGHT_START]\nYour recent launch of the Model Y refresh caught my eye.\n[HOOK_INSIGHT_END]\n\
        [SKILL_ALIGNMENT_START] Seven years of Rust and Python. [SKILL_ALIGNMENT_END]\n\
        [QUANTIFIABLE_ACHIEVEMENT_START]Cut batch runtime from 2 hours to 15 minutes.[QUANTIFIABLE_ACHIEVEMENT_END]\n\
        [CULTURE_FIT_START]\n\n  I thrive on fast iteration.  \n[CULTURE_FIT_END]\nGood luck!";

    #[test]
    fn test_extracts_trimmed_text_between_tags() {
        let result = extract_sections("noise [A_START]  hello world  [A_END] noise", &spec_a());
        assert_eq!(result.get("a"), Some("hello world"));
        assert!(result.missing().is_empty());
        assert!(result.is_complete());
    }

    #[test]
    fn test_missing_tags_report_section_as_missing() {
        let result = extract_sections("no tags here", &spec_a());
        assert_eq!(result.get("a"), None);
        assert_eq!(result.missing(), vec!["a"]);
        assert_eq!(result.sections()[0].content, None);
    }

    #[test]
    fn test_missing_start_tag_only() {
        let result = extract_sections("body [A_END]", &spec_a());
        assert_eq!(result.missing(), vec!["a"]);
    }

    #[test]
    fn test_missing_end_tag_only() {
        let result = extract_sections("[A_START] body", &spec_a());
        assert_eq!(result.missing(), vec!["a"]);
    }

    #[test]
    fn test_end_tag_before_start_tag_is_absent() {
        let result = extract_sections("[A_END] early [A_START] body [A_END]", &spec_a());
        assert_eq!(result.get("a"), None);
        assert_eq!(result.missing(), vec!["a"]);
    }

    #[test]
    fn test_whitespace_only_section_is_absent() {
        let result = extract_sections("[A_START] \n\t [A_END]", &spec_a());
        assert_eq!(result.missing(), vec!["a"]);
    }

    #[test]
    fn test_adjacent_tags_are_absent() {
        let result = extract_sections("[A_START][A_END]", &spec_a());
        assert_eq!(result.missing(), vec!["a"]);
    }

    #[test]
    fn test_uses_first_occurrence_of_each_tag() {
        let result = extract_sections("[A_START] one [A_END] [A_START] two [A_END]", &spec_a());
        assert_eq!(result.get("a"), Some("one"));
    }

    #[test]
    fn test_preserves_interior_whitespace_and_newlines() {
        let result = extract_sections("[A_START]\n line 1\n\n line 2 \n[A_END]", &spec_a());
        assert_eq!(result.get("a"), Some("line 1\n\n line 2"));
    }

    #[test]
    fn test_cover_letter_spec_extracts_all_four_sections() {
        let result = extract_sections(FULL_RESPONSE, &SectionSpec::cover_letter().unwrap());
        assert!(result.is_complete());
        assert_eq!(
            result.get(HOOK_INSIGHT),
            Some("Your recent launch of the Model Y refresh caught my eye.")
        );
        assert_eq!(
            result.get(SKILL_ALIGNMENT),
            Some("Seven years of Rust and Python.")
        );
        assert_eq!(
            result.get(QUANTIFIABLE_ACHIEVEMENT),
            Some("Cut batch runtime from 2 hours to 15 minutes.")
        );
        assert_eq!(result.get(CULTURE_FIT), Some("I thrive on fast iteration."));
    }

    #[test]
    fn test_missing_sections_reported_in_spec_order() {
        let raw = "[SKILL_ALIGNMENT_START] skills [SKILL_ALIGNMENT_END]";
        let result = extract_sections(raw, &SectionSpec::cover_letter().unwrap());
        assert_eq!(
            result.missing(),
            vec![HOOK_INSIGHT, QUANTIFIABLE_ACHIEVEMENT, CULTURE_FIT]
        );
        let err = result.into_complete().unwrap_err();
        assert_eq!(err.missing.len(), 3);
        assert!(err.to_string().starts_with("Failed to parse sections: ai_hook_insight"));
    }

    #[test]
    fn test_into_complete_returns_every_section() {
        let complete = extract_sections(FULL_RESPONSE, &SectionSpec::cover_letter().unwrap())
            .into_complete()
            .unwrap();
        assert_eq!(complete.len(), 4);
        assert_eq!(complete[CULTURE_FIT], "I thrive on fast iteration.");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let spec = SectionSpec::cover_letter().unwrap();
        let first = extract_sections(FULL_RESPONSE, &spec);
        let second = extract_sections(FULL_RESPONSE, &spec);
        assert_eq!(first, second);
    }

    #[test]
    fn test_definition_order_does_not_change_content() {
        let forward = SectionSpec::cover_letter().unwrap();
        let mut reversed_sections = forward.sections().to_vec();
        reversed_sections.reverse();
        let reversed = SectionSpec::new(reversed_sections).unwrap();

        let a = extract_sections(FULL_RESPONSE, &forward).into_complete().unwrap();
        let b = extract_sections(FULL_RESPONSE, &reversed).into_complete().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_handles_multibyte_content() {
        let result = extract_sections("[A_START] café — naïve ✓ [A_END]", &spec_a());
        assert_eq!(result.get("a"), Some("café — naïve ✓"));
    }

    #[test]
    fn test_spec_rejects_duplicate_names() {
        let err = SectionSpec::new(vec![
            Section::new("a", "[A1]", "[A2]"),
            Section::new("a", "[B1]", "[B2]"),
        ])
        .unwrap_err();
        assert_eq!(err, SectionSpecError::DuplicateName("a".to_string()));
    }

    #[test]
    fn test_spec_rejects_shared_tags() {
        let err = SectionSpec::new(vec![
            Section::new("a", "[X]", "[A_END]"),
            Section::new("b", "[X]", "[B_END]"),
        ])
        .unwrap_err();
        assert_eq!(err, SectionSpecError::DuplicateTag("[X]".to_string()));
    }

    #[test]
    fn test_spec_rejects_empty_tags() {
        let err = SectionSpec::new(vec![Section::new("a", "", "[A_END]")]).unwrap_err();
        assert_eq!(err, SectionSpecError::EmptyTag("a".to_string()));
    }

    #[test]
    fn test_cover_letter_spec_is_ordered_and_valid() {
        let spec = SectionSpec::cover_letter().unwrap();
        let names: Vec<&str> = spec.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![HOOK_INSIGHT, SKILL_ALIGNMENT, QUANTIFIABLE_ACHIEVEMENT, CULTURE_FIT]
        );
    }

    #[test]
    fn test_extraction_serializes_absent_as_null() {
        let result = extract_sections("no tags", &spec_a());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "sections": [{ "name": "a", "content": null }] })
        );
    }
}
