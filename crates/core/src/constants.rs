//! Constants used throughout the NCP core crate.
//!
//! Code system identifiers, configuration defaults and the generic placeholder labels shown
//! when nothing better can be resolved.

use std::time::Duration;

/// LOINC code system OID.
pub const LOINC_OID: &str = "2.16.840.1.113883.6.1";

/// SNOMED CT code system OID.
pub const SNOMED_CT_OID: &str = "2.16.840.1.113883.6.96";

/// ICD-10 code system OID.
pub const ICD_10_OID: &str = "2.16.840.1.113883.6.3";

/// ATC code system OID.
pub const ATC_OID: &str = "2.16.840.1.113883.6.73";

/// LOINC document type code of a Patient Summary.
pub const PATIENT_SUMMARY_DOCUMENT: &str = "60591-5";

/// LOINC document type code of an ePrescription.
pub const E_PRESCRIPTION_DOCUMENT: &str = "57833-6";

/// Prefix used by FHIR when an OID is carried as a URI.
pub const URN_OID_PREFIX: &str = "urn:oid:";

/// Well-known FHIR code system URIs and the OIDs the catalogue keys them by.
pub const CODE_SYSTEM_URIS: &[(&str, &str)] = &[
    ("http://loinc.org", LOINC_OID),
    ("http://snomed.info/sct", SNOMED_CT_OID),
    ("http://hl7.org/fhir/sid/icd-10", ICD_10_OID),
    ("http://www.whocc.no/atc", ATC_OID),
];

/// Default bound on a single catalogue lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Default time-to-live of a cached catalogue answer.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached catalogue answers.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Placeholder for an organization with no resolvable name or type.
pub const GENERIC_ORGANIZATION: &str = "Healthcare Organization";

/// Placeholder for a practitioner with no resolvable name or role.
pub const GENERIC_PRACTITIONER: &str = "Healthcare Professional";

/// Placeholder for a related person with no resolvable name or relationship.
pub const GENERIC_RELATED_PERSON: &str = "Related Person";

/// Placeholder for a social history observation with no resolvable code.
pub const GENERIC_SOCIAL_HISTORY: &str = "Social history observation";

/// Placeholder for a communication language with no resolvable code.
pub const GENERIC_LANGUAGE: &str = "Language";

/// Placeholder for a coded value when the caller supplies no domain label.
pub const GENERIC_CODED_VALUE: &str = "Unspecified";
