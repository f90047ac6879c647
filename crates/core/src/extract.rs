//! Code extraction from document-shaped resources.
//!
//! Everything here is extract-or-default: a missing field yields nothing, a field holding a
//! singleton where a list is expected is treated as a one-item list, and a fragment with an
//! unexpected shape becomes an [`ExtractionIssue`] instead of an error. The functions are pure;
//! callers turn issues into diagnostics.
//!
//! Recognised coded shapes:
//! - FHIR `CodeableConcept`: `{coding: [{system, code, display}], text}`
//! - FHIR `Coding`: `{system, code, display}`
//! - CDA `CD`: `{code, codeSystem, displayName, originalText}`

use crate::coded::CodedValue;
use crate::diagnostics::Diagnostics;
use crate::{TerminologyError, TerminologyResult};
use serde_json::Value;

/// A recoverable problem found while extracting one fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionIssue {
    /// Location of the fragment, for example `qualification[1].code`.
    pub field: String,
    pub message: String,
}

impl ExtractionIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type FieldResult<T> = Result<T, ExtractionIssue>;

/// Dotted path to a coded field, for example `qualification.code`.
///
/// Lists met along the way are flattened, so `qualification.code` reaches the code of every
/// qualification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::InvalidInput`] if the path or any segment is empty.
    pub fn parse(path: &str) -> TerminologyResult<Self> {
        let segments: Vec<String> = path.split('.').map(|s| s.trim().to_owned()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(TerminologyError::InvalidInput(format!(
                "invalid field path '{path}'"
            )));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Extract every coded value reachable through `path`.
///
/// Never fails: unusable fragments are skipped and reported to `diagnostics` as extraction
/// warnings against `resource_kind`.
pub fn extract(
    resource: &Value,
    path: &FieldPath,
    resource_kind: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<CodedValue> {
    let (values, issues) = extract_coded(resource, path);
    report_issues(resource_kind, issues, diagnostics);
    values
}

/// Pure form of [`extract`]: values plus the issues met on the way.
pub fn extract_coded(
    resource: &Value,
    path: &FieldPath,
) -> (Vec<CodedValue>, Vec<ExtractionIssue>) {
    let mut issues = Vec::new();
    let nodes = walk(resource, path, &mut issues);

    let values = nodes
        .into_iter()
        .filter_map(|(label, node)| match coded_value(node, &label) {
            Ok(value) => Some(value),
            Err(issue) => {
                issues.push(issue);
                None
            }
        })
        .collect();

    (values, issues)
}

/// Push each issue into `diagnostics` as an extraction warning.
pub fn report_issues(
    resource_kind: &str,
    issues: Vec<ExtractionIssue>,
    diagnostics: &mut Diagnostics,
) {
    for issue in issues {
        diagnostics.extraction_warning(resource_kind, &issue.field, issue.message);
    }
}

/// Follow `path` from `root`, flattening lists. Returns each reached node with its label.
fn walk<'a>(
    root: &'a Value,
    path: &FieldPath,
    issues: &mut Vec<ExtractionIssue>,
) -> Vec<(String, &'a Value)> {
    let mut current: Vec<(String, &'a Value)> = vec![(String::new(), root)];

    for segment in path.segments() {
        let mut next = Vec::new();
        for (label, node) in current {
            match node {
                Value::Object(map) => {
                    let child_label = join_label(&label, segment);
                    next.extend(labelled_items(&child_label, map.get(segment)));
                }
                _ => issues.push(ExtractionIssue::new(
                    if label.is_empty() { "<root>".to_owned() } else { label },
                    format!("expected a mapping while looking for '{segment}'"),
                )),
            }
        }
        current = next;
    }

    current
}

fn join_label(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_owned()
    } else {
        format!("{parent}.{segment}")
    }
}

/// Items of a possibly-list field with their labels (`field[i]` for lists).
pub(crate) fn labelled_items<'a>(
    label: &str,
    value: Option<&'a Value>,
) -> Vec<(String, &'a Value)> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(i, item)| (format!("{label}[{i}]"), item))
            .collect(),
        Some(single) => vec![(label.to_owned(), single)],
    }
}

/// Items of a possibly-list field, tolerating a singleton in place of a list.
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(single) => vec![single],
    }
}

/// Trimmed non-empty string at `key`.
pub fn string_at(node: &Value, key: &str) -> Option<String> {
    node.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Every non-empty string under a possibly-list field.
pub fn strings_at(node: &Value, key: &str) -> Vec<String> {
    as_list(node.get(key))
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Boolean at `key`, accepting `"true"`/`"false"` strings.
pub fn bool_at(node: &Value, key: &str) -> Option<bool> {
    match node.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Interpret one node as a coded value.
///
/// For a `CodeableConcept` the first coding carrying both a code and a system supplies the
/// code, and the free text is the concept's `text`, else the display of the first coding entry.
pub fn coded_value(node: &Value, label: &str) -> FieldResult<CodedValue> {
    let Value::Object(map) = node else {
        return Err(ExtractionIssue::new(label, "expected a coded mapping"));
    };

    if map.contains_key("coding") {
        let codings = as_list(map.get("coding"));
        let chosen = codings.iter().copied().find_map(|c| {
            let code = string_at(c, "code")?;
            let system = string_at(c, "system")?;
            Some((c, code, system))
        });

        let Some((chosen, code, system)) = chosen else {
            return Err(match codings.iter().find_map(|c| string_at(c, "code")) {
                Some(code) => ExtractionIssue::new(label, format!("coding '{code}' has no system")),
                None => ExtractionIssue::new(label, "coding has no entry with a code"),
            });
        };

        let text = string_at(node, "text")
            .or_else(|| codings.first().and_then(|c| string_at(c, "display")))
            .or_else(|| string_at(chosen, "display"));

        return Ok(CodedValue::new(code, system, text.as_deref()));
    }

    let Some(code) = string_at(node, "code") else {
        return Err(ExtractionIssue::new(label, "missing coding"));
    };

    // CDA CD carries codeSystem; a bare FHIR Coding carries system.
    let system = string_at(node, "codeSystem")
        .or_else(|| string_at(node, "system"))
        .ok_or_else(|| ExtractionIssue::new(label, format!("code '{code}' has no code system")))?;

    let text = string_at(node, "displayName")
        .or_else(|| string_at(node, "display"))
        .or_else(|| string_at(node, "originalText"))
        .or_else(|| string_at(node, "text"));

    Ok(CodedValue::new(code, system, text.as_deref()))
}
