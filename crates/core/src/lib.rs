//! # NCP Core
//!
//! Terminology translation core for the National Contact Point.
//!
//! This crate turns coded clinical concepts from a foreign document into display-ready terms
//! in the reader's language:
//! - Shape-tolerant extraction of coded values and aggregate entities (Organization,
//!   Practitioner, RelatedPerson) from document-shaped values
//! - Catalogue lookups with a bounded timeout and a short-lived shared cache
//! - A tiered resolution policy: catalogue designation, then document free text, then a
//!   generic placeholder
//! - Unavailability markers for resource kinds a document failed to supply
//!
//! **No wire concerns**: parsing FHIR bundles belongs in `fhir`; presenting the results belongs
//! to the caller.

pub mod aggregate;
pub mod availability;
pub mod catalogue;
pub mod coded;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod pass;
pub mod resolution;
pub mod roles;

pub use aggregate::{assemble_aggregate, AggregateEntity, ResourceKind};
pub use availability::{check_availability, AvailabilityState, UnavailabilityMarker};
pub use catalogue::{CachedCatalogue, CatalogueClient, InMemoryCatalogue, TerminologyCatalogue};
pub use coded::{CodedValue, ResolvedTerm, SourceTier};
pub use config::CoreConfig;
pub use diagnostics::{DiagnosticKind, DiagnosticRecord, Diagnostics};
pub use error::{TerminologyError, TerminologyResult};
pub use extract::{extract, FieldPath};
pub use pass::{parse_document, DocumentContract, DocumentFormat, PassReport, ResolutionPass};
pub use resolution::{EntityDisplay, ResolutionEngine, ResolverStrategy};
