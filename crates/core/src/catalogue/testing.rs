//! Catalogue doubles shared by unit tests.

use super::{CatalogueEntry, CatalogueKey, InMemoryCatalogue, TerminologyCatalogue};
use crate::constants::LOINC_OID;
use crate::{TerminologyError, TerminologyResult};
use async_trait::async_trait;
use ncp_types::{LanguageCode, NonEmptyText};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Catalogue holding the tobacco smoking status concept in three languages.
pub(crate) fn smoking_status_catalogue() -> InMemoryCatalogue {
    let mut catalogue = InMemoryCatalogue::new();
    for (lang, text) in [
        ("en", "Tobacco smoking status"),
        ("pt", "Status de tabagismo"),
        ("es", "Estado de tabaquismo"),
    ] {
        catalogue.insert(
            "72166-2",
            LOINC_OID,
            LanguageCode::parse(lang).expect("language"),
            NonEmptyText::new(text).expect("text"),
        );
    }
    catalogue
}

enum Behaviour {
    Answer(InMemoryCatalogue),
    Delay(InMemoryCatalogue, Duration),
    Unreachable,
}

/// Catalogue with scripted behaviour that counts the lookups it receives.
pub(crate) struct ScriptedCatalogue {
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl ScriptedCatalogue {
    pub(crate) fn answering(inner: InMemoryCatalogue) -> Self {
        Self {
            behaviour: Behaviour::Answer(inner),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn delayed(inner: InMemoryCatalogue, delay: Duration) -> Self {
        Self {
            behaviour: Behaviour::Delay(inner, delay),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn unreachable() -> Self {
        Self {
            behaviour: Behaviour::Unreachable,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TerminologyCatalogue for ScriptedCatalogue {
    async fn lookup(&self, key: &CatalogueKey) -> TerminologyResult<Option<CatalogueEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Answer(inner) => inner.lookup(key).await,
            Behaviour::Delay(inner, delay) => {
                tokio::time::sleep(*delay).await;
                inner.lookup(key).await
            }
            Behaviour::Unreachable => Err(TerminologyError::CatalogueUnavailable {
                reason: "connection refused".into(),
            }),
        }
    }
}
