//! Embedded lookup-table catalogue loaded from a YAML export.
//!
//! Wire format:
//!
//! ```yaml
//! entries:
//!   - code: "72166-2"
//!     codeSystem: "2.16.840.1.113883.6.1"
//!     designations:
//!       en: Tobacco smoking status
//!       pt: Status de tabagismo
//! ```
//!
//! Validation is strict: unknown keys, blank codes, duplicate concepts, unusable language
//! tags and empty designations are all rejected with the failing path.

use super::{CatalogueEntry, CatalogueKey, TerminologyCatalogue};
use crate::coded::normalise_code_system;
use crate::{TerminologyError, TerminologyResult};
use async_trait::async_trait;
use ncp_types::{LanguageCode, NonEmptyText};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// In-memory catalogue. Lookups never fail and never suspend.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalogue {
    entries: HashMap<CatalogueKey, CatalogueEntry>,
}

impl InMemoryCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalogue from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::CatalogueFile`] if the YAML does not match the wire schema
    /// or violates a catalogue rule.
    pub fn from_yaml(yaml_text: &str) -> TerminologyResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, CatalogueWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(TerminologyError::CatalogueFile(format!(
                    "catalogue schema mismatch at {path}: {source}"
                )));
            }
        };

        wire_to_catalogue(wire)
    }

    /// Read and parse a catalogue file.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::FileRead`] if the file cannot be read, otherwise as
    /// [`InMemoryCatalogue::from_yaml`].
    pub fn load(path: &Path) -> TerminologyResult<Self> {
        let text = std::fs::read_to_string(path).map_err(TerminologyError::FileRead)?;
        Self::from_yaml(&text)
    }

    /// Add or replace one designation.
    pub fn insert(
        &mut self,
        code: &str,
        code_system: &str,
        language: LanguageCode,
        display: NonEmptyText,
    ) {
        let key = CatalogueKey::new(code.trim(), normalise_code_system(code_system));
        self.entries
            .entry(key.clone())
            .or_insert_with(|| CatalogueEntry {
                key,
                designations: BTreeMap::new(),
            })
            .designations
            .insert(language, display);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CatalogueKey) -> Option<&CatalogueEntry> {
        self.entries.get(key)
    }
}

#[async_trait]
impl TerminologyCatalogue for InMemoryCatalogue {
    async fn lookup(&self, key: &CatalogueKey) -> TerminologyResult<Option<CatalogueEntry>> {
        Ok(self.entries.get(key).cloned())
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogueWire {
    #[serde(default)]
    pub entries: Vec<CatalogueEntryWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogueEntryWire {
    pub code: NonEmptyText,

    #[serde(rename = "codeSystem")]
    pub code_system: NonEmptyText,

    pub designations: BTreeMap<LanguageCode, NonEmptyText>,
}

fn wire_to_catalogue(wire: CatalogueWire) -> TerminologyResult<InMemoryCatalogue> {
    let mut entries = HashMap::with_capacity(wire.entries.len());

    for (index, entry) in wire.entries.into_iter().enumerate() {
        let key = CatalogueKey::new(
            entry.code.as_str(),
            normalise_code_system(entry.code_system.as_str()),
        );

        if entry.designations.is_empty() {
            return Err(TerminologyError::CatalogueFile(format!(
                "entries[{index}] ({}|{}) has no designations",
                key.code_system, key.code
            )));
        }

        if entries.contains_key(&key) {
            return Err(TerminologyError::CatalogueFile(format!(
                "entries[{index}] duplicates {}|{}",
                key.code_system, key.code
            )));
        }

        entries.insert(
            key.clone(),
            CatalogueEntry {
                key,
                designations: entry.designations,
            },
        );
    }

    Ok(InMemoryCatalogue { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::LOINC_OID;
    use std::io::Write;

    const SAMPLE: &str = r#"entries:
  - code: "72166-2"
    codeSystem: "2.16.840.1.113883.6.1"
    designations:
      en: Tobacco smoking status
      PT: Status de tabagismo
  - code: "22232009"
    codeSystem: "http://snomed.info/sct"
    designations:
      en: Hospital
"#;

    #[tokio::test]
    async fn parses_and_looks_up_entries() {
        let catalogue = InMemoryCatalogue::from_yaml(SAMPLE).expect("parse catalogue");
        assert_eq!(catalogue.len(), 2);

        let entry = catalogue
            .lookup(&CatalogueKey::new("72166-2", LOINC_OID))
            .await
            .expect("lookup")
            .expect("entry");
        let pt = LanguageCode::parse("pt").expect("language");
        assert_eq!(
            entry.designations.get(&pt).map(NonEmptyText::as_str),
            Some("Status de tabagismo")
        );
    }

    #[tokio::test]
    async fn code_system_uris_are_normalised_on_load() {
        let catalogue = InMemoryCatalogue::from_yaml(SAMPLE).expect("parse catalogue");
        let entry = catalogue
            .lookup(&CatalogueKey::new("22232009", "2.16.840.1.113883.6.96"))
            .await
            .expect("lookup");
        assert!(entry.is_some());
    }

    #[test]
    fn empty_document_is_an_empty_catalogue() {
        let catalogue = InMemoryCatalogue::from_yaml("entries: []\n").expect("parse");
        assert!(catalogue.is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        let input = r#"entries:
  - code: "X"
    codeSystem: "Y"
    designations: {en: Thing}
    colour: blue
"#;
        let err = InMemoryCatalogue::from_yaml(input).expect_err("should reject unknown key");
        match err {
            TerminologyError::CatalogueFile(msg) => {
                assert!(msg.contains("colour"));
                assert!(msg.contains("entries[0]"));
            }
            other => panic!("expected CatalogueFile error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_code() {
        let input = r#"entries:
  - code: "  "
    codeSystem: "Y"
    designations: {en: Thing}
"#;
        let err = InMemoryCatalogue::from_yaml(input).expect_err("should reject blank code");
        assert!(matches!(err, TerminologyError::CatalogueFile(msg) if msg.contains("code")));
    }

    #[test]
    fn rejects_bad_language_tag() {
        let input = r#"entries:
  - code: "X"
    codeSystem: "Y"
    designations: {english: Thing}
"#;
        let err = InMemoryCatalogue::from_yaml(input).expect_err("should reject language");
        assert!(
            matches!(err, TerminologyError::CatalogueFile(msg) if msg.contains("designations"))
        );
    }

    #[test]
    fn rejects_empty_designations_and_duplicates() {
        let empty = r#"entries:
  - code: "X"
    codeSystem: "Y"
    designations: {}
"#;
        let err = InMemoryCatalogue::from_yaml(empty).expect_err("should reject");
        assert!(matches!(
            err,
            TerminologyError::CatalogueFile(msg) if msg.contains("no designations")
        ));

        let duplicate = r#"entries:
  - code: "X"
    codeSystem: "urn:oid:1.2.3"
    designations: {en: One}
  - code: "X"
    codeSystem: "1.2.3"
    designations: {en: Two}
"#;
        let err = InMemoryCatalogue::from_yaml(duplicate).expect_err("should reject");
        assert!(matches!(err, TerminologyError::CatalogueFile(msg) if msg.contains("duplicates")));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write catalogue");

        let catalogue = InMemoryCatalogue::load(file.path()).expect("load catalogue");
        assert_eq!(catalogue.len(), 2);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = InMemoryCatalogue::load(&dir.path().join("absent.yaml"))
            .expect_err("should fail to read");
        assert!(matches!(err, TerminologyError::FileRead(_)));
    }

    #[test]
    fn insert_merges_designations() {
        let mut catalogue = InMemoryCatalogue::new();
        catalogue.insert(
            "X",
            "urn:oid:1.2.3",
            LanguageCode::parse("en").expect("language"),
            NonEmptyText::new("Thing").expect("text"),
        );
        catalogue.insert(
            "X",
            "1.2.3",
            LanguageCode::parse("fr").expect("language"),
            NonEmptyText::new("Chose").expect("text"),
        );

        assert_eq!(catalogue.len(), 1);
        let entry = catalogue
            .get(&CatalogueKey::new("X", "1.2.3"))
            .expect("entry");
        assert_eq!(entry.designations.len(), 2);
    }
}
