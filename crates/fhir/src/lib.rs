//! FHIR wire/boundary support for the NCP terminology core.
//!
//! This crate turns FHIR-shaped document text (JSON or YAML) into a [`ClinicalDocument`]: the
//! document type plus the raw resources it carries, grouped by `resourceType` and kept as
//! generic document-shaped values.
//!
//! This crate focuses on:
//! - envelope validation (what makes a document unusable as a whole)
//! - serialisation/deserialisation of the envelope
//! - reference lookup between resources of the same document
//!
//! It does NOT interpret clinical content. Field extraction and terminology resolution live in
//! `ncp-core`.

pub mod document;

// Re-export facades
pub use document::ClinicalDocument;

// Re-export public domain-level types
pub use document::{DocumentType, RawResource, SkippedEntry};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
