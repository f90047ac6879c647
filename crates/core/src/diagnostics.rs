//! Structured diagnostics channel.
//!
//! Components never log on their own. Each one receives a `&mut Diagnostics` and pushes
//! records into it; the caller decides when (and whether) to forward them to `tracing` via
//! [`Diagnostics::emit`].

use serde::Serialize;

/// Severity of a diagnostic record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warning,
}

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A sub-field had an unexpected shape; extraction continued with it empty.
    ExtractionWarning,
    /// The catalogue could not be reached or timed out; resolution fell through.
    CatalogueUnavailable,
    /// The catalogue had no entry for a code; routine.
    CatalogueMiss,
    /// An expected resource kind produced no entities.
    ResourceClassAbsent,
}

impl DiagnosticKind {
    /// The level a record of this kind is reported at.
    pub fn level(self) -> DiagnosticLevel {
        match self {
            DiagnosticKind::ExtractionWarning
            | DiagnosticKind::CatalogueUnavailable
            | DiagnosticKind::ResourceClassAbsent => DiagnosticLevel::Warning,
            DiagnosticKind::CatalogueMiss => DiagnosticLevel::Info,
        }
    }
}

/// One diagnostic record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub level: DiagnosticLevel,
    pub kind: DiagnosticKind,

    /// Resource kind being processed, if any (for example `Practitioner`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_kind: Option<String>,

    /// Sub-field or code the record is about (for example `qualification[1]`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    pub message: String,
}

/// Collector for diagnostic records produced during one pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    records: Vec<DiagnosticRecord>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record something at the default level for its kind.
    pub fn push(
        &mut self,
        kind: DiagnosticKind,
        resource_kind: Option<&str>,
        field: Option<&str>,
        message: impl Into<String>,
    ) {
        self.records.push(DiagnosticRecord {
            level: kind.level(),
            kind,
            resource_kind: resource_kind.map(str::to_owned),
            field: field.map(str::to_owned),
            message: message.into(),
        });
    }

    /// Shorthand for an [`DiagnosticKind::ExtractionWarning`].
    pub fn extraction_warning(
        &mut self,
        resource_kind: &str,
        field: &str,
        message: impl Into<String>,
    ) {
        self.push(
            DiagnosticKind::ExtractionWarning,
            Some(resource_kind),
            Some(field),
            message,
        );
    }

    pub fn records(&self) -> &[DiagnosticRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &DiagnosticRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// Forward every record to `tracing` at its level.
    pub fn emit(&self) {
        for record in &self.records {
            let resource_kind = record.resource_kind.as_deref().unwrap_or("-");
            let field = record.field.as_deref().unwrap_or("-");
            match record.level {
                DiagnosticLevel::Warning => tracing::warn!(
                    kind = ?record.kind,
                    resource_kind,
                    field,
                    "{}",
                    record.message
                ),
                DiagnosticLevel::Info => tracing::info!(
                    kind = ?record.kind,
                    resource_kind,
                    field,
                    "{}",
                    record.message
                ),
            }
        }
    }
}
