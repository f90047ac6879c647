//! Coded clinical values and their resolved display terms.

use crate::constants::{CODE_SYSTEM_URIS, URN_OID_PREFIX};
use ncp_types::{LanguageCode, NonEmptyText};
use serde::Serialize;
use std::collections::BTreeMap;

/// Normalise a code system identifier to the form the catalogue is keyed by.
///
/// Known FHIR URIs map to their OID, `urn:oid:` prefixes are stripped, and anything else is
/// returned trimmed but otherwise unchanged.
pub fn normalise_code_system(identifier: &str) -> String {
    let trimmed = identifier.trim();

    if let Some(oid) = trimmed.strip_prefix(URN_OID_PREFIX) {
        return oid.to_owned();
    }

    let without_slash = trimmed.trim_end_matches('/');
    CODE_SYSTEM_URIS
        .iter()
        .find(|(uri, _)| *uri == without_slash)
        .map(|(_, oid)| (*oid).to_owned())
        .unwrap_or_else(|| trimmed.to_owned())
}

/// One coded clinical concept.
///
/// `code` and `code_system` together identify the concept. `text` is the free-text label the
/// source document carried, possibly in another language than the one being displayed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodedValue {
    pub code: String,
    pub code_system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodedValue {
    /// Build a coded value, normalising the code system and dropping blank text.
    pub fn new(code: impl Into<String>, code_system: impl AsRef<str>, text: Option<&str>) -> Self {
        Self {
            code: code.into().trim().to_owned(),
            code_system: normalise_code_system(code_system.as_ref()),
            text: NonEmptyText::from_optional(text).map(NonEmptyText::into_string),
        }
    }

    /// The source text, if it carries anything displayable.
    pub fn source_text(&self) -> Option<NonEmptyText> {
        NonEmptyText::from_optional(self.text.as_deref())
    }
}

impl std::fmt::Display for CodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.code_system, self.code)
    }
}

/// Where a resolved display value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceTier {
    /// Validated designation from the terminology catalogue.
    Catalogue,
    /// Free text carried by the source document.
    SourceText,
    /// Generic placeholder chosen by the caller's domain.
    GenericFallback,
}

/// A display-ready term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTerm {
    pub display_value: NonEmptyText,
    pub source_tier: SourceTier,

    /// Every designation the catalogue holds, when all languages were requested.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<LanguageCode, String>,
}

impl ResolvedTerm {
    pub fn new(display_value: NonEmptyText, source_tier: SourceTier) -> Self {
        Self {
            display_value,
            source_tier,
            translations: BTreeMap::new(),
        }
    }

    pub fn display(&self) -> &str {
        self.display_value.as_str()
    }
}
