//! Resolution policy engine.
//!
//! Turns coded values into display-ready terms by trying an ordered list of
//! [`ResolverStrategy`] tiers; the first tier that produces a term wins. The default order
//! prefers validated catalogue designations over document free text, and free text over a
//! generic placeholder. The result is never empty.

use crate::aggregate::{display_name, AggregateEntity, Period, Reference, ResourceKind};
use crate::catalogue::CatalogueClient;
use crate::coded::{CodedValue, ResolvedTerm, SourceTier};
use crate::constants::{GENERIC_CODED_VALUE, GENERIC_LANGUAGE};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::roles::{PositionalClassifier, QualificationClassifier};
use crate::{TerminologyError, TerminologyResult};
use fhir::ClinicalDocument;
use ncp_types::{LanguageCode, NonEmptyText};
use serde::Serialize;
use std::sync::Arc;

/// One resolution tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolverStrategy {
    /// Ask the terminology catalogue.
    Catalogue,
    /// Use the free text carried by the document.
    SourceText,
    /// Use the placeholder supplied by the caller.
    GenericFallback,
}

pub const DEFAULT_STRATEGIES: [ResolverStrategy; 3] = [
    ResolverStrategy::Catalogue,
    ResolverStrategy::SourceText,
    ResolverStrategy::GenericFallback,
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualificationDisplay {
    pub term: ResolvedTerm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LanguageDisplay {
    pub term: ResolvedTerm,
    pub preferred: bool,
}

/// An aggregate with every coded sub-field resolved for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDisplay {
    pub name: ResolvedTerm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ResolvedTerm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<ResolvedTerm>,
    pub types: Vec<ResolvedTerm>,
    pub qualifications: Vec<QualificationDisplay>,
    pub languages: Vec<LanguageDisplay>,
    pub relationships: Vec<ResolvedTerm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of: Option<String>,
    pub entity: AggregateEntity,
}

/// Applies the tier policy. Cheap to clone; clones share the catalogue client.
#[derive(Clone)]
pub struct ResolutionEngine {
    client: CatalogueClient,
    strategies: Vec<ResolverStrategy>,
    classifier: Arc<dyn QualificationClassifier>,
    include_all_languages: bool,
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("client", &self.client)
            .field("strategies", &self.strategies)
            .field("include_all_languages", &self.include_all_languages)
            .finish_non_exhaustive()
    }
}

impl ResolutionEngine {
    /// Engine with the default tier order and the positional role classifier.
    pub fn new(client: CatalogueClient) -> Self {
        Self {
            client,
            strategies: DEFAULT_STRATEGIES.to_vec(),
            classifier: Arc::new(PositionalClassifier),
            include_all_languages: false,
        }
    }

    /// Replace the tier order.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::InvalidInput`] if `strategies` has no
    /// [`ResolverStrategy::GenericFallback`], since then a term could end up empty.
    pub fn with_strategies(mut self, strategies: Vec<ResolverStrategy>) -> TerminologyResult<Self> {
        if !strategies.contains(&ResolverStrategy::GenericFallback) {
            return Err(TerminologyError::InvalidInput(
                "resolver strategies must include GENERIC_FALLBACK".into(),
            ));
        }
        self.strategies = strategies;
        Ok(self)
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn QualificationClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Carry every catalogue designation on catalogue-tier terms.
    pub fn with_all_languages(mut self, include_all_languages: bool) -> Self {
        self.include_all_languages = include_all_languages;
        self
    }

    pub fn strategies(&self) -> &[ResolverStrategy] {
        &self.strategies
    }

    pub fn client(&self) -> &CatalogueClient {
        &self.client
    }

    /// Resolve one coded value for display in `target_language`.
    ///
    /// `placeholder` is the generic label for the caller's domain; a blank placeholder is
    /// replaced by a neutral one. Catalogue misses and unavailability are recorded in
    /// `diagnostics` and never fail the call.
    pub async fn resolve_with_fallback(
        &self,
        value: &CodedValue,
        target_language: &LanguageCode,
        placeholder: &str,
        diagnostics: &mut Diagnostics,
    ) -> ResolvedTerm {
        self.resolve_for(None, value, target_language, placeholder, diagnostics)
            .await
    }

    async fn resolve_for(
        &self,
        resource_kind: Option<&str>,
        value: &CodedValue,
        target_language: &LanguageCode,
        placeholder: &str,
        diagnostics: &mut Diagnostics,
    ) -> ResolvedTerm {
        for strategy in &self.strategies {
            let found = match strategy {
                ResolverStrategy::Catalogue => {
                    self.lookup_catalogue(resource_kind, value, target_language, diagnostics)
                        .await
                }
                ResolverStrategy::SourceText => value
                    .source_text()
                    .map(|text| ResolvedTerm::new(text, SourceTier::SourceText)),
                ResolverStrategy::GenericFallback => Some(generic(placeholder)),
            };

            if let Some(term) = found {
                return term;
            }
        }

        generic(placeholder)
    }

    async fn lookup_catalogue(
        &self,
        resource_kind: Option<&str>,
        value: &CodedValue,
        target_language: &LanguageCode,
        diagnostics: &mut Diagnostics,
    ) -> Option<ResolvedTerm> {
        let field = value.to_string();
        match self
            .client
            .resolve(value, target_language, self.include_all_languages)
            .await
        {
            Ok(Some(term)) => Some(term),
            Ok(None) => {
                diagnostics.push(
                    DiagnosticKind::CatalogueMiss,
                    resource_kind,
                    Some(field.as_str()),
                    format!("no catalogue designation in '{target_language}'"),
                );
                None
            }
            Err(err) => {
                diagnostics.push(
                    DiagnosticKind::CatalogueUnavailable,
                    resource_kind,
                    Some(field.as_str()),
                    format!("{err}; falling back"),
                );
                None
            }
        }
    }

    /// Resolve every coded sub-field of `entity` for display.
    ///
    /// `document`, when given, is used to label references that carry no display of their
    /// own (qualification issuers, `partOf`).
    pub async fn resolve_aggregate(
        &self,
        entity: &AggregateEntity,
        target_language: &LanguageCode,
        document: Option<&ClinicalDocument>,
        diagnostics: &mut Diagnostics,
    ) -> EntityDisplay {
        let kind = entity.kind.as_str();
        let generic_label = entity.kind.generic_label();

        let name = NonEmptyText::from_optional(entity.name.as_deref())
            .map(|text| ResolvedTerm::new(text, SourceTier::SourceText))
            .unwrap_or_else(|| generic(generic_label));

        let mut types = Vec::with_capacity(entity.types.len());
        for value in &entity.types {
            types.push(
                self.resolve_for(Some(kind), value, target_language, generic_label, diagnostics)
                    .await,
            );
        }

        let mut qualifications = Vec::with_capacity(entity.qualifications.len());
        for qualification in &entity.qualifications {
            let term = self
                .resolve_for(
                    Some(kind),
                    &qualification.code,
                    target_language,
                    generic_label,
                    diagnostics,
                )
                .await;
            qualifications.push(QualificationDisplay {
                term,
                issuer: qualification
                    .issuer
                    .as_ref()
                    .and_then(|issuer| reference_label(issuer, document)),
                period: qualification.period.clone(),
            });
        }

        let mut languages = Vec::with_capacity(entity.communications.len());
        for communication in &entity.communications {
            let term = self
                .resolve_for(
                    Some(kind),
                    &communication.language,
                    target_language,
                    GENERIC_LANGUAGE,
                    diagnostics,
                )
                .await;
            languages.push(LanguageDisplay {
                term,
                preferred: communication.preferred,
            });
        }

        let mut relationships = Vec::with_capacity(entity.relationships.len());
        for value in &entity.relationships {
            relationships.push(
                self.resolve_for(Some(kind), value, target_language, generic_label, diagnostics)
                    .await,
            );
        }

        let assignment = self.classifier.classify(&entity.qualifications);
        let pick = |index: Option<usize>| {
            index
                .and_then(|i| qualifications.get(i))
                .map(|q: &QualificationDisplay| q.term.clone())
        };
        let role = pick(assignment.role);
        let specialty = pick(assignment.specialty);

        EntityDisplay {
            name,
            role,
            specialty,
            types,
            qualifications,
            languages,
            relationships,
            part_of: entity
                .part_of
                .as_ref()
                .and_then(|part_of| reference_label(part_of, document)),
            entity: entity.clone(),
        }
    }
}

fn generic(placeholder: &str) -> ResolvedTerm {
    ResolvedTerm::new(
        NonEmptyText::with_fallback(placeholder, GENERIC_CODED_VALUE),
        SourceTier::GenericFallback,
    )
}

/// A reference's own display, else the name of the resource it points at.
fn reference_label(reference: &Reference, document: Option<&ClinicalDocument>) -> Option<String> {
    if let Some(display) = &reference.display {
        return Some(display.clone());
    }

    let target = document?.resolve_reference(reference.reference.as_deref()?)?;
    display_name(ResourceKind::from_resource_type(&target.kind), &target.body)
}
