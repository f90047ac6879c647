//! Terminology catalogue client.
//!
//! A [`TerminologyCatalogue`] answers "what are the designations of `(code, codeSystem)`?".
//! It is the only place the core performs I/O, so it is async and shared across passes.
//! [`CatalogueClient`] puts a bounded timeout around every lookup and applies the target
//! language.
//!
//! Answers are three-way:
//! - `Ok(Some(entry))`: the catalogue knows the concept
//! - `Ok(None)`: the catalogue answered and does not know it (a miss)
//! - `Err(e)` with [`TerminologyError::is_catalogue_unavailable`]: no answer at all

pub mod cache;
pub mod memory;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::CachedCatalogue;
pub use memory::InMemoryCatalogue;

use crate::coded::{CodedValue, ResolvedTerm, SourceTier};
use crate::config::CoreConfig;
use crate::{TerminologyError, TerminologyResult};
use async_trait::async_trait;
use ncp_types::{LanguageCode, NonEmptyText};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Key of a catalogue concept.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogueKey {
    pub code: String,
    pub code_system: String,
}

impl CatalogueKey {
    pub fn new(code: impl Into<String>, code_system: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            code_system: code_system.into(),
        }
    }
}

impl From<&CodedValue> for CatalogueKey {
    fn from(value: &CodedValue) -> Self {
        Self::new(value.code.clone(), value.code_system.clone())
    }
}

/// Everything the catalogue holds for one concept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub key: CatalogueKey,
    pub designations: BTreeMap<LanguageCode, NonEmptyText>,
}

impl CatalogueEntry {
    /// Designation for `language`: the exact tag first, then its primary subtag.
    pub fn designation(&self, language: &LanguageCode) -> Option<&NonEmptyText> {
        if let Some(found) = self.designations.get(language) {
            return Some(found);
        }

        if language.has_subtag() {
            let primary = LanguageCode::parse(language.primary()).ok()?;
            return self.designations.get(&primary);
        }

        None
    }
}

/// A read-only source of terminology designations.
#[async_trait]
pub trait TerminologyCatalogue: Send + Sync {
    /// Look up a concept.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::CatalogueUnavailable`] when the source cannot answer.
    /// A concept the source does not know is `Ok(None)`, not an error.
    async fn lookup(&self, key: &CatalogueKey) -> TerminologyResult<Option<CatalogueEntry>>;
}

#[async_trait]
impl<T: TerminologyCatalogue + ?Sized> TerminologyCatalogue for Arc<T> {
    async fn lookup(&self, key: &CatalogueKey) -> TerminologyResult<Option<CatalogueEntry>> {
        (**self).lookup(key).await
    }
}

/// Timeout-bounded, language-aware front of a [`TerminologyCatalogue`].
///
/// Cheap to clone; clones share the underlying catalogue.
#[derive(Clone)]
pub struct CatalogueClient {
    source: Arc<dyn TerminologyCatalogue>,
    timeout: Duration,
}

impl std::fmt::Debug for CatalogueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogueClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CatalogueClient {
    pub fn new(source: Arc<dyn TerminologyCatalogue>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Wrap `source` in a [`CachedCatalogue`] sized and timed from `config`.
    pub fn from_config<C>(source: C, config: &CoreConfig) -> Self
    where
        C: TerminologyCatalogue + 'static,
    {
        let cached = CachedCatalogue::new(source, config.cache_ttl(), config.cache_max_entries());
        Self::new(Arc::new(cached), config.lookup_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve `value` to its catalogue designation in `target_language`.
    ///
    /// Returns `Ok(None)` when the catalogue has no entry for the concept, or has one but no
    /// designation usable for `target_language`. With `include_all_languages`, the returned
    /// term also carries every designation the catalogue holds.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::CatalogueTimeout`] if the lookup exceeds the configured
    /// timeout, or whatever unavailability error the source reports.
    pub async fn resolve(
        &self,
        value: &CodedValue,
        target_language: &LanguageCode,
        include_all_languages: bool,
    ) -> TerminologyResult<Option<ResolvedTerm>> {
        let key = CatalogueKey::from(value);

        let entry = match tokio::time::timeout(self.timeout, self.source.lookup(&key)).await {
            Ok(answer) => answer?,
            Err(_) => return Err(TerminologyError::CatalogueTimeout(self.timeout)),
        };

        let Some(entry) = entry else {
            return Ok(None);
        };

        let Some(display) = entry.designation(target_language) else {
            return Ok(None);
        };

        let mut term = ResolvedTerm::new(display.clone(), SourceTier::Catalogue);
        if include_all_languages {
            term.translations = entry
                .designations
                .iter()
                .map(|(lang, text)| (lang.clone(), text.as_str().to_owned()))
                .collect();
        }

        Ok(Some(term))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{smoking_status_catalogue, ScriptedCatalogue};
    use super::*;
    use crate::constants::LOINC_OID;

    fn lang(tag: &str) -> LanguageCode {
        LanguageCode::parse(tag).expect("valid language")
    }

    fn smoking_status() -> CodedValue {
        CodedValue::new("72166-2", LOINC_OID, Some("Status de tabagismo"))
    }

    #[tokio::test]
    async fn resolves_target_language_designation() {
        let client = CatalogueClient::new(
            Arc::new(smoking_status_catalogue()),
            Duration::from_secs(1),
        );

        let term = client
            .resolve(&smoking_status(), &lang("en"), false)
            .await
            .expect("catalogue answers")
            .expect("entry found");

        assert_eq!(term.display(), "Tobacco smoking status");
        assert_eq!(term.source_tier, SourceTier::Catalogue);
        assert!(term.translations.is_empty());
    }

    #[tokio::test]
    async fn include_all_languages_populates_translations() {
        let client = CatalogueClient::new(
            Arc::new(smoking_status_catalogue()),
            Duration::from_secs(1),
        );

        let term = client
            .resolve(&smoking_status(), &lang("pt"), true)
            .await
            .expect("catalogue answers")
            .expect("entry found");

        assert_eq!(term.display(), "Status de tabagismo");
        assert_eq!(term.translations.len(), 3);
        assert_eq!(
            term.translations.get(&lang("en")).map(String::as_str),
            Some("Tobacco smoking status")
        );
    }

    #[tokio::test]
    async fn region_tag_falls_back_to_primary_language() {
        let client = CatalogueClient::new(
            Arc::new(smoking_status_catalogue()),
            Duration::from_secs(1),
        );

        let term = client
            .resolve(&smoking_status(), &lang("en-GB"), false)
            .await
            .expect("catalogue answers")
            .expect("entry found");
        assert_eq!(term.display(), "Tobacco smoking status");
    }

    #[tokio::test]
    async fn unknown_code_is_none_not_error() {
        let client = CatalogueClient::new(
            Arc::new(smoking_status_catalogue()),
            Duration::from_secs(1),
        );

        let result = client
            .resolve(&CodedValue::new("X", "Y", None), &lang("en"), false)
            .await
            .expect("miss is not an error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn missing_language_is_a_miss() {
        let client = CatalogueClient::new(
            Arc::new(smoking_status_catalogue()),
            Duration::from_secs(1),
        );

        let result = client
            .resolve(&smoking_status(), &lang("de"), true)
            .await
            .expect("catalogue answers");
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_lookup_times_out_as_unavailable() {
        let slow = ScriptedCatalogue::delayed(smoking_status_catalogue(), Duration::from_secs(30));
        let client = CatalogueClient::new(Arc::new(slow), Duration::from_millis(100));

        let err = client
            .resolve(&smoking_status(), &lang("en"), false)
            .await
            .expect_err("should time out");
        assert!(matches!(err, TerminologyError::CatalogueTimeout(_)));
        assert!(err.is_catalogue_unavailable());
    }

    #[tokio::test]
    async fn unreachable_source_is_unavailable() {
        let client = CatalogueClient::new(
            Arc::new(ScriptedCatalogue::unreachable()),
            Duration::from_secs(1),
        );

        let err = client
            .resolve(&smoking_status(), &lang("en"), false)
            .await
            .expect_err("should be unavailable");
        assert!(err.is_catalogue_unavailable());
    }
}
