//! AcroForm inspection and filling.
//!
//! Only field values are written. Appearance streams are dropped from filled
//! fields and `NeedAppearances` is set so the viewer lays the text out.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use serde::Serialize;
use tracing::{debug, warn};

use crate::pdf::PdfError;

/// Default appearance applied to every field that declares one: ITC Avant Garde 10pt, black.
pub const DEFAULT_APPEARANCE: &str = "/AvantGarde 10 Tf 0 g";

/// Field trees deeper than this are treated as cyclic and not descended.
const MAX_FIELD_DEPTH: usize = 32;

/// A terminal form field as listed by `list_form_fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    /// Fully qualified name (`parent.child`).
    pub name: String,
    pub field_type: Option<String>,
    pub value: Option<String>,
}

/// Outcome of a fill: which fields were written and which values had no field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub filled: Vec<String>,
    pub unmatched: Vec<String>,
}

#[derive(Debug)]
struct FieldRef {
    id: ObjectId,
    full_name: String,
    partial_name: String,
}

enum AcroFormLocation {
    Indirect(ObjectId),
    InCatalog(ObjectId),
}

/// Lists every terminal field in the document's AcroForm.
pub fn list_form_fields(pdf: &[u8]) -> Result<Vec<FormField>, PdfError> {
    let doc = Document::load_mem(pdf)?;
    let fields = collect_fields(&doc)?;

    fields
        .iter()
        .map(|field| -> Result<FormField, PdfError> {
            let dict = doc.get_object(field.id)?.as_dict()?;
            Ok(FormField {
                name: field.full_name.clone(),
                field_type: dict
                    .get(b"FT")
                    .and_then(Object::as_name)
                    .ok()
                    .map(|n| String::from_utf8_lossy(n).into_owned()),
                value: dict
                    .get(b"V")
                    .and_then(Object::as_str)
                    .ok()
                    .map(decode_text_string),
            })
        })
        .collect()
}

/// Writes `values` into the matching fields of `template` and returns the new PDF.
///
/// A value matches a field by fully qualified name first, then by its
/// partial (`/T`) name. Values with no matching field are reported, not
/// treated as errors.
pub fn fill_form(
    template: &[u8],
    values: &BTreeMap<String, String>,
) -> Result<(Vec<u8>, FillReport), PdfError> {
    let mut doc = Document::load_mem(template)?;
    let location = acroform_location(&doc)?;
    let fields = collect_fields(&doc)?;

    let mut report = FillReport::default();
    let mut used_keys: Vec<&str> = Vec::new();

    for field in &fields {
        let matched = values
            .get_key_value(&field.full_name)
            .or_else(|| values.get_key_value(&field.partial_name));

        let dict = doc.get_object_mut(field.id)?.as_dict_mut()?;
        if dict.has(b"DA") {
            dict.set("DA", Object::string_literal(DEFAULT_APPEARANCE));
        }

        if let Some((key, value)) = matched {
            dict.set("V", encode_text_string(value));
            dict.remove(b"AP");
            used_keys.push(key.as_str());
            report.filled.push(field.full_name.clone());
        }
    }

    report.unmatched = values
        .keys()
        .filter(|k| !used_keys.contains(&k.as_str()))
        .cloned()
        .collect();
    if !report.unmatched.is_empty() {
        warn!("No form field for: {}", report.unmatched.join(", "));
    }

    acroform_mut(&mut doc, &location)?.set("NeedAppearances", Object::Boolean(true));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::Save(e.to_string()))?;

    debug!(
        "Filled {} of {} form fields ({} bytes)",
        report.filled.len(),
        fields.len(),
        buffer.len()
    );

    Ok((buffer, report))
}

// ────────────────────────────────────────────────────────────────────────────
// Field tree walking
// ────────────────────────────────────────────────────────────────────────────

fn acroform_location(doc: &Document) -> Result<AcroFormLocation, PdfError> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let catalog = doc.get_object(catalog_id)?.as_dict()?;

    match catalog.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Ok(AcroFormLocation::Indirect(*id)),
        Ok(Object::Dictionary(_)) => Ok(AcroFormLocation::InCatalog(catalog_id)),
        _ => Err(PdfError::NoAcroForm),
    }
}

fn acroform<'a>(doc: &'a Document, location: &AcroFormLocation) -> Result<&'a Dictionary, PdfError> {
    let dict = match location {
        AcroFormLocation::Indirect(id) => doc.get_object(*id)?.as_dict()?,
        AcroFormLocation::InCatalog(catalog_id) => doc
            .get_object(*catalog_id)?
            .as_dict()?
            .get(b"AcroForm")?
            .as_dict()?,
    };
    Ok(dict)
}

fn acroform_mut<'a>(
    doc: &'a mut Document,
    location: &AcroFormLocation,
) -> Result<&'a mut Dictionary, PdfError> {
    let dict = match location {
        AcroFormLocation::Indirect(id) => doc.get_object_mut(*id)?.as_dict_mut()?,
        AcroFormLocation::InCatalog(catalog_id) => doc
            .get_object_mut(*catalog_id)?
            .as_dict_mut()?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?,
    };
    Ok(dict)
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object, PdfError> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Terminal fields reachable from `/AcroForm /Fields`, in document order.
fn collect_fields(doc: &Document) -> Result<Vec<FieldRef>, PdfError> {
    let location = acroform_location(doc)?;
    let form = acroform(doc, &location)?;

    let roots = match form.get(b"Fields") {
        Ok(fields) => resolve(doc, fields)?.as_array()?,
        Err(_) => return Ok(Vec::new()),
    };

    let mut out = Vec::new();
    for root in roots {
        walk_field(doc, root, None, 0, &mut out)?;
    }
    Ok(out)
}

fn walk_field(
    doc: &Document,
    object: &Object,
    parent_name: Option<&str>,
    depth: usize,
    out: &mut Vec<FieldRef>,
) -> Result<(), PdfError> {
    if depth > MAX_FIELD_DEPTH {
        warn!("Form field tree deeper than {MAX_FIELD_DEPTH}; skipping remainder");
        return Ok(());
    }

    // Inline field dictionaries cannot be addressed for writing; none of the
    // templates we fill use them.
    let Object::Reference(id) = object else {
        return Ok(());
    };
    let dict = doc.get_object(*id)?.as_dict()?;

    let partial_name = partial_name(dict);
    let full_name = match (parent_name, &partial_name) {
        (Some(parent), Some(partial)) => format!("{parent}.{partial}"),
        (None, Some(partial)) => partial.clone(),
        (Some(parent), None) => parent.to_string(),
        (None, None) => String::new(),
    };

    let kids: &[Object] = match dict.get(b"Kids") {
        Ok(kids) => resolve(doc, kids)?.as_array()?,
        Err(_) => &[],
    };

    // Kids without /T are widget annotations of this field, not child fields.
    let child_fields: Vec<&Object> = kids
        .iter()
        .filter(|kid| {
            resolve(doc, kid)
                .ok()
                .and_then(|k| k.as_dict().ok())
                .is_some_and(|k| k.has(b"T"))
        })
        .collect();

    if child_fields.is_empty() {
        if let Some(partial_name) = partial_name {
            out.push(FieldRef {
                id: *id,
                full_name,
                partial_name,
            });
        }
        return Ok(());
    }

    for kid in child_fields {
        walk_field(doc, kid, Some(full_name.as_str()), depth + 1, out)?;
    }
    Ok(())
}

fn partial_name(dict: &Dictionary) -> Option<String> {
    dict.get(b"T")
        .and_then(Object::as_str)
        .ok()
        .map(decode_text_string)
}

// ────────────────────────────────────────────────────────────────────────────
// Text string encoding
// ────────────────────────────────────────────────────────────────────────────

/// ASCII goes in as a literal string; anything else as UTF-16BE with a BOM.
fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use lopdf::dictionary;

    use super::*;

    /// Builds a one-page PDF whose AcroForm holds text fields with the given
    /// names, plus an `address` parent field with a `street` child.
    pub(crate) fn form_pdf(names: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut field_refs: Vec<Object> = names
            .iter()
            .map(|name| {
                let id = doc.add_object(dictionary! {
                    "FT" => "Tx",
                    "T" => Object::string_literal(*name),
                    "DA" => Object::string_literal("/Helv 12 Tf 0 g"),
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "Rect" => Object::Array(vec![
                        Object::Integer(50),
                        Object::Integer(600),
                        Object::Integer(550),
                        Object::Integer(620),
                    ]),
                });
                Object::Reference(id)
            })
            .collect();

        let parent_id = doc.new_object_id();
        let street_id = doc.add_object(dictionary! {
            "FT" => "Tx",
            "T" => Object::string_literal("street"),
            "Parent" => parent_id,
            "Type" => "Annot",
            "Subtype" => "Widget",
        });
        doc.objects.insert(
            parent_id,
            Object::Dictionary(dictionary! {
                "T" => Object::string_literal("address"),
                "Kids" => Object::Array(vec![Object::Reference(street_id)]),
            }),
        );
        field_refs.push(Object::Reference(parent_id));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
            "Annots" => Object::Array(field_refs.clone()),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Object::Array(vec![Object::Reference(page_id)]),
                "Count" => 1,
            }),
        );

        let acroform_id = doc.add_object(dictionary! {
            "Fields" => Object::Array(field_refs),
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => acroform_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn field<'a>(fields: &'a [FormField], name: &str) -> &'a FormField {
        fields.iter().find(|f| f.name == name).unwrap()
    }

    #[test]
    fn test_list_form_fields_returns_terminal_fields() {
        let pdf = form_pdf(&["company_name", "ai_hook_insight"]);
        let fields = list_form_fields(&pdf).unwrap();

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["company_name", "ai_hook_insight", "address.street"]);
        assert_eq!(fields[0].field_type.as_deref(), Some("Tx"));
        assert_eq!(fields[0].value, None);
    }

    #[test]
    fn test_fill_form_sets_values_and_reports_unmatched() {
        let pdf = form_pdf(&["company_name", "ai_hook_insight"]);
        let (filled, report) = fill_form(
            &pdf,
            &values(&[
                ("company_name", "Tesla"),
                ("ai_hook_insight", "Your battery work stands out."),
                ("not_a_field", "ignored"),
            ]),
        )
        .unwrap();

        assert_eq!(report.filled, vec!["company_name", "ai_hook_insight"]);
        assert_eq!(report.unmatched, vec!["not_a_field"]);

        let fields = list_form_fields(&filled).unwrap();
        assert_eq!(field(&fields, "company_name").value.as_deref(), Some("Tesla"));
        assert_eq!(
            field(&fields, "ai_hook_insight").value.as_deref(),
            Some("Your battery work stands out.")
        );
        assert_eq!(field(&fields, "address.street").value, None);
    }

    #[test]
    fn test_fill_form_matches_qualified_and_partial_names() {
        let pdf = form_pdf(&[]);
        let (filled, report) = fill_form(&pdf, &values(&[("address.street", "619 Stud Street")])).unwrap();
        assert!(report.unmatched.is_empty());
        let fields = list_form_fields(&filled).unwrap();
        assert_eq!(
            field(&fields, "address.street").value.as_deref(),
            Some("619 Stud Street")
        );

        let (filled, _) = fill_form(&pdf, &values(&[("street", "1 Main St")])).unwrap();
        let fields = list_form_fields(&filled).unwrap();
        assert_eq!(field(&fields, "address.street").value.as_deref(), Some("1 Main St"));
    }

    #[test]
    fn test_fill_form_overrides_appearance_and_sets_need_appearances() {
        let pdf = form_pdf(&["company_name"]);
        let (filled, _) = fill_form(&pdf, &values(&[("company_name", "Tesla")])).unwrap();

        let doc = Document::load_mem(&filled).unwrap();
        let location = acroform_location(&doc).unwrap();
        let form = acroform(&doc, &location).unwrap();
        assert!(matches!(form.get(b"NeedAppearances"), Ok(Object::Boolean(true))));

        let fields = collect_fields(&doc).unwrap();
        let dict = doc.get_object(fields[0].id).unwrap().as_dict().unwrap();
        assert_eq!(
            dict.get(b"DA").unwrap().as_str().unwrap(),
            DEFAULT_APPEARANCE.as_bytes()
        );
    }

    #[test]
    fn test_fill_form_round_trips_non_ascii_values() {
        let pdf = form_pdf(&["company_name"]);
        let (filled, _) = fill_form(&pdf, &values(&[("company_name", "Société Générale")])).unwrap();
        let fields = list_form_fields(&filled).unwrap();
        assert_eq!(
            field(&fields, "company_name").value.as_deref(),
            Some("Société Générale")
        );
    }

    #[test]
    fn test_pdf_without_acroform_is_rejected() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(vec![]),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();

        assert!(matches!(list_form_fields(&buffer), Err(PdfError::NoAcroForm)));
    }

    #[test]
    fn test_garbage_bytes_are_a_structure_error() {
        assert!(matches!(
            list_form_fields(b"definitely not a pdf"),
            Err(PdfError::Structure(_))
        ));
    }

    #[test]
    fn test_text_string_encoding() {
        assert_eq!(
            decode_text_string(encode_text_string("plain").as_str().unwrap()),
            "plain"
        );
        let encoded = encode_text_string("naïve");
        assert_eq!(encoded.as_str().unwrap()[..2], [0xFE, 0xFF]);
        assert_eq!(decode_text_string(encoded.as_str().unwrap()), "naïve");
    }
}
