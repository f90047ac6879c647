//! FHIR-aligned clinical document envelope and resource grouping.
//!
//! This module accepts either a FHIR `Bundle` (the usual shape of a patient summary document)
//! or a single bare resource, and produces a [`ClinicalDocument`].
//!
//! Responsibilities:
//! - Reject text that cannot be a document at all (not a mapping, no `resourceType`,
//!   `entry` that is not a list)
//! - Group entry resources by `resourceType`, preserving document order
//! - Record entries that had to be skipped instead of failing the whole document
//! - Derive the document type from the first `Composition`
//!
//! Notes:
//! - Resource bodies are kept verbatim as `serde_json::Value`; nothing here knows about
//!   clinical fields beyond `resourceType`, `id` and `Composition.type`

use crate::{FhirError, FhirResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Coded document type, taken from `Composition.type.coding[0]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentType {
    pub system: Option<String>,
    pub code: String,
    pub display: Option<String>,
}

/// One resource carried by a document.
#[derive(Clone, Debug, PartialEq)]
pub struct RawResource {
    /// The `resourceType` of the resource (for example `Practitioner`).
    pub kind: String,

    /// The logical id of the resource, if present.
    pub id: Option<String>,

    /// The bundle entry `fullUrl`, if present.
    pub full_url: Option<String>,

    /// The resource body, untouched.
    pub body: Value,
}

/// A bundle entry that could not be turned into a [`RawResource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position of the entry in `Bundle.entry`.
    pub index: usize,

    /// Why the entry was skipped.
    pub reason: String,
}

/// A parsed clinical document.
#[derive(Clone, Debug, PartialEq)]
pub struct ClinicalDocument {
    /// Document type, if the document carries a `Composition` with a coded type.
    pub document_type: Option<DocumentType>,

    resources: BTreeMap<String, Vec<RawResource>>,

    /// Entries that were present but unusable.
    pub skipped_entries: Vec<SkippedEntry>,
}

impl ClinicalDocument {
    /// Parse a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the text is not JSON or the envelope is unusable.
    pub fn parse_json(json_text: &str) -> FhirResult<Self> {
        let value: Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    /// Parse a document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the text is not YAML or the envelope is unusable.
    pub fn parse_yaml(yaml_text: &str) -> FhirResult<Self> {
        let value: Value = serde_yaml::from_str(yaml_text)?;
        Self::from_value(value)
    }

    /// Build a document from an already-parsed value.
    ///
    /// A `Bundle` contributes its entry resources. Any other resource becomes a
    /// one-resource document.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the value is not a mapping or lacks
    /// `resourceType`, and [`FhirError::Translation`] if the bundle envelope does not match
    /// the wire schema (for example `entry` is not a list).
    pub fn from_value(value: Value) -> FhirResult<Self> {
        let resource_type = match &value {
            Value::Object(map) => map
                .get("resourceType")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| {
                    FhirError::InvalidInput("document has no string resourceType".into())
                })?,
            _ => {
                return Err(FhirError::InvalidInput(
                    "document must be a mapping at the top level".into(),
                ))
            }
        };

        if resource_type != "Bundle" {
            let resource = raw_resource(value, None).ok_or_else(|| {
                FhirError::InvalidInput("document has no string resourceType".into())
            })?;
            let mut document = Self::empty();
            document.push(resource);
            document.document_type = document.derive_document_type();
            return Ok(document);
        }

        let wire = match serde_path_to_error::deserialize::<_, BundleWire>(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Bundle schema mismatch at {path}: {source}"
                )));
            }
        };

        let mut document = Self::empty();
        for (index, entry) in wire.entry.into_iter().enumerate() {
            match entry.resource {
                Some(body) => match raw_resource(body, entry.full_url) {
                    Some(resource) => document.push(resource),
                    None => document.skipped_entries.push(SkippedEntry {
                        index,
                        reason: "entry resource has no resourceType".into(),
                    }),
                },
                None => document.skipped_entries.push(SkippedEntry {
                    index,
                    reason: "entry has no resource".into(),
                }),
            }
        }
        document.document_type = document.derive_document_type();

        Ok(document)
    }

    /// All resources of the given `resourceType`, in document order.
    pub fn resources(&self, kind: &str) -> &[RawResource] {
        self.resources.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The `resourceType`s present in the document.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Total number of resources carried by the document.
    pub fn len(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a resource by a literal reference.
    ///
    /// Accepts relative references (`Organization/123`), absolute URLs ending in a relative
    /// reference, and `fullUrl` matches (`urn:uuid:...`).
    pub fn resolve_reference(&self, reference: &str) -> Option<&RawResource> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        let all = || self.resources.values().flatten();

        if let Some(found) = all().find(|r| r.full_url.as_deref() == Some(reference)) {
            return Some(found);
        }

        let mut segments = reference.rsplit('/');
        let id = segments.next()?;
        let kind = segments.next()?;
        self.resources(kind)
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
    }

    fn empty() -> Self {
        Self {
            document_type: None,
            resources: BTreeMap::new(),
            skipped_entries: Vec::new(),
        }
    }

    fn push(&mut self, resource: RawResource) {
        self.resources
            .entry(resource.kind.clone())
            .or_default()
            .push(resource);
    }

    fn derive_document_type(&self) -> Option<DocumentType> {
        let composition = self.resources("Composition").first()?;
        let coding = composition
            .body
            .get("type")?
            .get("coding")?
            .as_array()?
            .first()?;

        let code = coding.get("code")?.as_str()?.trim();
        if code.is_empty() {
            return None;
        }

        Some(DocumentType {
            system: coding
                .get("system")
                .and_then(Value::as_str)
                .map(str::to_owned),
            code: code.to_owned(),
            display: coding
                .get("display")
                .and_then(Value::as_str)
                .map(str::to_owned),
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of the bundle envelope.
///
/// Unknown envelope keys (`id`, `meta`, `timestamp`, ...) are tolerated; only the shape of
/// `entry` matters here.
#[derive(Debug, Deserialize)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    #[allow(dead_code)]
    pub resource_type: String,

    #[serde(default)]
    pub entry: Vec<BundleEntryWire>,
}

/// Wire representation of one bundle entry.
#[derive(Debug, Deserialize)]
struct BundleEntryWire {
    #[serde(rename = "fullUrl", default)]
    pub full_url: Option<String>,

    #[serde(default)]
    pub resource: Option<Value>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn raw_resource(body: Value, full_url: Option<String>) -> Option<RawResource> {
    let kind = body.get("resourceType")?.as_str()?.trim().to_owned();
    if kind.is_empty() {
        return None;
    }
    let id = body.get("id").and_then(Value::as_str).map(str::to_owned);

    Some(RawResource {
        kind,
        id,
        full_url,
        body,
    })
}
