use std::time::Duration;

/// Errors surfaced by the terminology core.
///
/// Only [`TerminologyError::MalformedDocument`] and configuration/catalogue-file errors are
/// meant to reach callers of a resolution pass. `CatalogueUnavailable` is absorbed by the
/// resolution engine and turned into a fallback.
#[derive(Debug, thiserror::Error)]
pub enum TerminologyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("terminology catalogue unavailable: {reason}")]
    CatalogueUnavailable { reason: String },

    #[error("terminology catalogue lookup timed out after {}ms", .0.as_millis())]
    CatalogueTimeout(Duration),

    #[error("invalid catalogue file: {0}")]
    CatalogueFile(String),

    #[error("failed to read catalogue file: {0}")]
    FileRead(std::io::Error),

    #[error("invalid text: {0}")]
    Text(#[from] ncp_types::TextError),
}

/// Any failure to read the document envelope is the fatal tier: nothing can be extracted.
impl From<fhir::FhirError> for TerminologyError {
    fn from(err: fhir::FhirError) -> Self {
        TerminologyError::MalformedDocument(err.to_string())
    }
}

impl TerminologyError {
    /// Whether this error means the catalogue could not answer, as opposed to answering "no".
    pub fn is_catalogue_unavailable(&self) -> bool {
        matches!(
            self,
            TerminologyError::CatalogueUnavailable { .. } | TerminologyError::CatalogueTimeout(_)
        )
    }
}

pub type TerminologyResult<T> = std::result::Result<T, TerminologyError>;
