//! One parse/resolve pass over a clinical document.
//!
//! A pass owns everything it creates. Passes share nothing but the catalogue client inside
//! the [`ResolutionEngine`], so any number of them may run concurrently.

use crate::aggregate::{assemble_aggregate, AggregateEntity, ResourceKind};
use crate::availability::{
    check_availability, AvailabilityState, AvailabilityTracker, UnavailabilityMarker,
};
use crate::constants::E_PRESCRIPTION_DOCUMENT;
use crate::diagnostics::Diagnostics;
use crate::resolution::{EntityDisplay, ResolutionEngine};
use crate::TerminologyResult;
use fhir::{ClinicalDocument, DocumentType};
use ncp_types::LanguageCode;
use serde::Serialize;
use std::collections::BTreeMap;

/// Text formats a document can arrive in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

/// Parse a document envelope.
///
/// # Errors
///
/// Returns [`crate::TerminologyError::MalformedDocument`] if the text is not a readable
/// document. This is the only fatal error of a pass.
pub fn parse_document(text: &str, format: DocumentFormat) -> TerminologyResult<ClinicalDocument> {
    let document = match format {
        DocumentFormat::Json => ClinicalDocument::parse_json(text)?,
        DocumentFormat::Yaml => ClinicalDocument::parse_yaml(text)?,
    };
    Ok(document)
}

/// A resource kind a document type is expected to carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expectation {
    pub kind: ResourceKind,
    /// Shown to the reader when the kind turns out to be absent.
    pub reason: String,
}

/// Which resource kinds a document type is expected to carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentContract {
    name: String,
    expectations: Vec<Expectation>,
}

impl DocumentContract {
    pub fn new(name: impl Into<String>, expectations: Vec<Expectation>) -> Self {
        Self {
            name: name.into(),
            expectations,
        }
    }

    pub fn patient_summary() -> Self {
        Self::new(
            "Patient Summary",
            vec![
                Expectation {
                    kind: ResourceKind::Practitioner,
                    reason: "Practitioner information was not provided by the country of origin".into(),
                },
                Expectation {
                    kind: ResourceKind::Organization,
                    reason: "Organization information was not provided by the country of origin".into(),
                },
            ],
        )
    }

    pub fn e_prescription() -> Self {
        Self::new(
            "ePrescription",
            vec![
                Expectation {
                    kind: ResourceKind::Practitioner,
                    reason: "The prescriber was not identified in this prescription".into(),
                },
                Expectation {
                    kind: ResourceKind::Organization,
                    reason: "The prescribing organization was not identified in this prescription".into(),
                },
            ],
        )
    }

    /// Contract for a document's declared type; unknown or missing types get the Patient
    /// Summary contract.
    pub fn for_document_type(document_type: Option<&DocumentType>) -> Self {
        match document_type.map(|t| t.code.as_str()) {
            Some(E_PRESCRIPTION_DOCUMENT) => Self::e_prescription(),
            _ => Self::patient_summary(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expectation(&self, kind: ResourceKind) -> Option<&Expectation> {
        self.expectations.iter().find(|e| e.kind == kind)
    }
}

/// Everything a pass produced, ready for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassReport {
    pub contract: String,
    pub language: LanguageCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    pub states: BTreeMap<ResourceKind, AvailabilityState>,
    pub entities: BTreeMap<ResourceKind, Vec<EntityDisplay>>,
    pub unavailable: Vec<UnavailabilityMarker>,
    pub diagnostics: Diagnostics,
}

impl PassReport {
    pub fn displays(&self, kind: ResourceKind) -> &[EntityDisplay] {
        self.entities.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn marker(&self, kind: ResourceKind) -> Option<&UnavailabilityMarker> {
        self.unavailable
            .iter()
            .find(|m| m.resource_kind == kind.as_str())
    }
}

/// Drives extraction, availability checks and resolution for one document.
#[derive(Clone, Debug)]
pub struct ResolutionPass {
    engine: ResolutionEngine,
}

impl ResolutionPass {
    pub fn new(engine: ResolutionEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ResolutionEngine {
        &self.engine
    }

    /// Run one pass.
    ///
    /// Every kind the contract expects, and every aggregate kind the document carries, goes
    /// `PENDING → EXTRACTED → AVAILABLE | UNAVAILABLE`. Expected kinds that end up
    /// unavailable get a marker. Nothing below the document envelope fails the pass.
    ///
    /// # Errors
    ///
    /// Only state-machine misuse, which this function never triggers itself.
    pub async fn run(
        &self,
        document: &ClinicalDocument,
        contract: &DocumentContract,
        language: &LanguageCode,
    ) -> TerminologyResult<PassReport> {
        let mut diagnostics = Diagnostics::new();

        for skipped in &document.skipped_entries {
            diagnostics.extraction_warning(
                "Bundle",
                &format!("entry[{}]", skipped.index),
                skipped.reason.clone(),
            );
        }

        let mut states = BTreeMap::new();
        let mut entities = BTreeMap::new();
        let mut unavailable = Vec::new();

        for kind in ResourceKind::ALL {
            let raw = document.resources(kind.as_str());
            let expectation = contract.expectation(kind);
            if raw.is_empty() && expectation.is_none() {
                continue;
            }

            let mut tracker = AvailabilityTracker::new(kind.as_str());
            let assembled: Vec<AggregateEntity> = raw
                .iter()
                .map(|resource| assemble_aggregate(kind, &resource.body, &mut diagnostics))
                .collect();
            tracker.extracted(assembled.len())?;

            if let Some(expectation) = expectation {
                let reason = expectation.reason.as_str();
                if let Some(marker) =
                    check_availability(&assembled, kind.as_str(), reason, &mut diagnostics)
                {
                    unavailable.push(marker);
                }
            }
            states.insert(kind, tracker.conclude()?);

            let mut displays = Vec::with_capacity(assembled.len());
            for entity in &assembled {
                displays.push(
                    self.engine
                        .resolve_aggregate(entity, language, Some(document), &mut diagnostics)
                        .await,
                );
            }
            if !displays.is_empty() {
                entities.insert(kind, displays);
            }
        }

        Ok(PassReport {
            contract: contract.name().to_owned(),
            language: language.clone(),
            document_type: document.document_type.as_ref().map(|t| t.code.clone()),
            states,
            entities,
            unavailable,
            diagnostics,
        })
    }
}
