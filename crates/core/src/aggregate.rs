//! Aggregate entity assembly.
//!
//! An [`AggregateEntity`] is an Organization, Practitioner or RelatedPerson assembled from
//! many optional sub-fields. Each sub-field has its own small extractor returning the value
//! plus the issues met; a broken sub-field never stops the others from being read.
//!
//! Both FHIR and CDA-flavoured shapes are accepted where they differ (identifiers as
//! `{system, value}` or `{root, extension}`, address lines as `line` or
//! `streetAddressLine`, telecoms with or without an explicit `system`).

use crate::coded::CodedValue;
use crate::constants::{GENERIC_ORGANIZATION, GENERIC_PRACTITIONER, GENERIC_RELATED_PERSON};
use crate::diagnostics::Diagnostics;
use crate::extract::{
    bool_at, coded_value, extract_coded, labelled_items, report_issues, string_at,
    strings_at, ExtractionIssue, FieldPath,
};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;

type Extracted<T> = (T, Vec<ExtractionIssue>);

// ============================================================================
// Public domain-level types
// ============================================================================

/// Resource kinds assembled into aggregates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResourceKind {
    Organization,
    Practitioner,
    RelatedPerson,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Organization,
        ResourceKind::Practitioner,
        ResourceKind::RelatedPerson,
    ];

    /// The FHIR `resourceType`.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Organization => "Organization",
            ResourceKind::Practitioner => "Practitioner",
            ResourceKind::RelatedPerson => "RelatedPerson",
        }
    }

    pub fn from_resource_type(resource_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == resource_type)
    }

    /// Placeholder shown when nothing about the entity can be resolved.
    pub fn generic_label(self) -> &'static str {
        match self {
            ResourceKind::Organization => GENERIC_ORGANIZATION,
            ResourceKind::Practitioner => GENERIC_PRACTITIONER,
            ResourceKind::RelatedPerson => GENERIC_RELATED_PERSON,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub value: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TelecomSystem {
    Phone,
    Email,
    Url,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Telecom {
    pub system: TelecomSystem,
    pub value: String,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Address {
    fn is_empty(&self) -> bool {
        self.lines.is_empty()
            && self.city.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
            && self.text.is_none()
    }
}

/// Literal reference to another resource, with an optional display label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Validity period. Bounds are kept as written; only well-formed dates are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Qualification {
    pub code: CodedValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Communication {
    pub language: CodedValue,
    pub preferred: bool,
}

/// Display-ready composite record. Every sub-field may be empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateEntity {
    pub kind: ResourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub identifiers: Vec<Identifier>,
    pub telecoms: Vec<Telecom>,
    pub addresses: Vec<Address>,
    pub types: Vec<CodedValue>,
    pub qualifications: Vec<Qualification>,
    pub communications: Vec<Communication>,
    pub relationships: Vec<CodedValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_of: Option<Reference>,
    pub aliases: Vec<String>,
}

impl AggregateEntity {
    /// An aggregate with nothing but its kind.
    pub fn empty(kind: ResourceKind) -> Self {
        Self {
            kind,
            id: None,
            name: None,
            active: None,
            gender: None,
            identifiers: Vec::new(),
            telecoms: Vec::new(),
            addresses: Vec::new(),
            types: Vec::new(),
            qualifications: Vec::new(),
            communications: Vec::new(),
            relationships: Vec::new(),
            period: None,
            part_of: None,
            aliases: Vec::new(),
        }
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Assemble an aggregate from one raw resource.
///
/// Never fails. Each sub-field is extracted independently; problems are reported to
/// `diagnostics` as extraction warnings and the affected sub-field is left empty.
pub fn assemble_aggregate(
    kind: ResourceKind,
    raw: &Value,
    diagnostics: &mut Diagnostics,
) -> AggregateEntity {
    let mut entity = AggregateEntity::empty(kind);
    let label = kind.as_str();

    if !raw.is_object() {
        diagnostics.extraction_warning(label, "<root>", "resource is not a mapping");
        return entity;
    }

    if let Some(found) = string_at(raw, "resourceType") {
        if found != label {
            diagnostics.extraction_warning(
                label,
                "resourceType",
                format!("expected {label}, found {found}"),
            );
        }
    }

    entity.id = string_at(raw, "id");
    entity.active = bool_at(raw, "active");
    entity.gender = string_at(raw, "gender");

    let mut issues = Vec::new();

    entity.name = take(&mut issues, name(kind, raw));
    entity.identifiers = take(&mut issues, identifiers(raw));
    entity.telecoms = take(&mut issues, telecoms(raw));
    entity.addresses = take(&mut issues, addresses(raw));
    entity.qualifications = take(&mut issues, qualifications(raw));
    entity.communications = take(&mut issues, communications(raw));
    entity.period = take(&mut issues, period_at(raw, "period"));
    entity.part_of = take(&mut issues, reference_at(raw, "partOf"));
    entity.aliases = take(&mut issues, aliases(raw));

    match kind {
        ResourceKind::Organization => entity.types = take(&mut issues, coded_list(raw, "type")),
        ResourceKind::RelatedPerson => {
            entity.relationships = take(&mut issues, coded_list(raw, "relationship"))
        }
        ResourceKind::Practitioner => {}
    }

    report_issues(label, issues, diagnostics);
    entity
}

// ============================================================================
// Sub-field extractors (internal)
// ============================================================================

fn take<T>(issues: &mut Vec<ExtractionIssue>, (value, found): Extracted<T>) -> T {
    issues.extend(found);
    value
}

fn coded_list(raw: &Value, field: &str) -> Extracted<Vec<CodedValue>> {
    match FieldPath::parse(field) {
        Ok(path) => extract_coded(raw, &path),
        Err(e) => (Vec::new(), vec![ExtractionIssue::new(field, e.to_string())]),
    }
}

fn name(kind: ResourceKind, raw: &Value) -> Extracted<Option<String>> {
    let Some(value) = raw.get("name") else {
        return (None, Vec::new());
    };

    if let Value::String(s) = value {
        let trimmed = s.trim();
        return ((!trimmed.is_empty()).then(|| trimmed.to_owned()), Vec::new());
    }

    if kind == ResourceKind::Organization {
        return (
            None,
            vec![ExtractionIssue::new("name", "organization name is not text")],
        );
    }

    // HumanName: the first usable entry wins.
    let mut issues = Vec::new();
    for (label, entry) in labelled_items("name", Some(value)) {
        match human_name(entry) {
            Some(found) => return (Some(found), issues),
            None => issues.push(ExtractionIssue::new(label, "name has no usable parts")),
        }
    }
    (None, issues)
}

/// Display name of a raw resource, issues ignored. Used to label references.
pub(crate) fn display_name(kind: Option<ResourceKind>, raw: &Value) -> Option<String> {
    match kind {
        Some(kind) => name(kind, raw).0,
        None => string_at(raw, "name"),
    }
}

fn human_name(entry: &Value) -> Option<String> {
    if let Value::String(s) = entry {
        let trimmed = s.trim();
        return (!trimmed.is_empty()).then(|| trimmed.to_owned());
    }

    if let Some(text) = string_at(entry, "text") {
        return Some(text);
    }

    let mut parts = strings_at(entry, "prefix");
    parts.extend(strings_at(entry, "given"));
    parts.extend(strings_at(entry, "family"));
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn identifiers(raw: &Value) -> Extracted<Vec<Identifier>> {
    let mut issues = Vec::new();
    let mut found = Vec::new();

    for (label, item) in labelled_items("identifier", raw.get("identifier")) {
        let value = string_at(item, "value").or_else(|| string_at(item, "extension"));
        match value {
            Some(value) => found.push(Identifier {
                system: string_at(item, "system").or_else(|| string_at(item, "root")),
                value,
            }),
            None => issues.push(ExtractionIssue::new(label, "identifier has no value")),
        }
    }

    (found, issues)
}

fn telecom_system(declared: Option<&str>, value: &str) -> Option<TelecomSystem> {
    match declared {
        Some("phone") | Some("fax") | Some("sms") => Some(TelecomSystem::Phone),
        Some("email") => Some(TelecomSystem::Email),
        Some("url") => Some(TelecomSystem::Url),
        Some(_) => None,
        None => {
            let lower = value.to_ascii_lowercase();
            if lower.starts_with("tel:") || lower.starts_with("fax:") {
                Some(TelecomSystem::Phone)
            } else if lower.starts_with("mailto:") {
                Some(TelecomSystem::Email)
            } else if lower.starts_with("http://") || lower.starts_with("https://") {
                Some(TelecomSystem::Url)
            } else {
                None
            }
        }
    }
}

fn strip_scheme(value: &str) -> &str {
    for scheme in ["tel:", "fax:", "mailto:"] {
        if let Some(head) = value.get(..scheme.len()) {
            if head.eq_ignore_ascii_case(scheme) {
                return value[scheme.len()..].trim();
            }
        }
    }
    value
}

fn telecoms(raw: &Value) -> Extracted<Vec<Telecom>> {
    let mut issues = Vec::new();
    let mut found = Vec::new();

    for (label, item) in labelled_items("telecom", raw.get("telecom")) {
        let Some(value) = string_at(item, "value") else {
            issues.push(ExtractionIssue::new(label, "telecom has no value"));
            continue;
        };

        let declared = string_at(item, "system");
        let Some(system) = telecom_system(declared.as_deref(), &value) else {
            issues.push(ExtractionIssue::new(
                label,
                format!(
                    "unsupported telecom system '{}'",
                    declared.as_deref().unwrap_or("<none>")
                ),
            ));
            continue;
        };

        found.push(Telecom {
            system,
            value: strip_scheme(&value).to_owned(),
            use_type: string_at(item, "use"),
        });
    }

    (found, issues)
}

fn addresses(raw: &Value) -> Extracted<Vec<Address>> {
    let mut issues = Vec::new();
    let mut found = Vec::new();

    for (label, item) in labelled_items("address", raw.get("address").or_else(|| raw.get("addr"))) {
        if !item.is_object() {
            issues.push(ExtractionIssue::new(label, "address is not a mapping"));
            continue;
        }

        let mut lines = strings_at(item, "line");
        lines.extend(strings_at(item, "streetAddressLine"));

        let address = Address {
            lines,
            city: string_at(item, "city"),
            postal_code: string_at(item, "postalCode"),
            country: string_at(item, "country"),
            text: string_at(item, "text"),
        };

        if address.is_empty() {
            issues.push(ExtractionIssue::new(label, "address has no usable parts"));
        } else {
            found.push(address);
        }
    }

    (found, issues)
}

fn reference(item: &Value, label: &str) -> Result<Reference, ExtractionIssue> {
    if !item.is_object() {
        return Err(ExtractionIssue::new(label, "reference is not a mapping"));
    }

    let reference = Reference {
        reference: string_at(item, "reference"),
        display: string_at(item, "display"),
    };

    if reference.reference.is_none() && reference.display.is_none() {
        return Err(ExtractionIssue::new(label, "reference has neither target nor display"));
    }
    Ok(reference)
}

fn reference_at(raw: &Value, field: &str) -> Extracted<Option<Reference>> {
    match raw.get(field) {
        None | Some(Value::Null) => (None, Vec::new()),
        Some(item) => match reference(item, field) {
            Ok(found) => (Some(found), Vec::new()),
            Err(issue) => (None, vec![issue]),
        },
    }
}

/// Parse a FHIR date, partial date or dateTime into its first day.
fn parse_date(value: &str) -> Option<NaiveDate> {
    match value.len() {
        4 => NaiveDate::parse_from_str(&format!("{value}-01-01"), "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok(),
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        _ => DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| dt.date_naive()),
    }
}

fn period(item: &Value, label: &str) -> Extracted<Option<Period>> {
    if !item.is_object() {
        return (None, vec![ExtractionIssue::new(label, "period is not a mapping")]);
    }

    let mut issues = Vec::new();
    let mut bound = |key: &str| -> Option<(String, NaiveDate)> {
        let value = string_at(item, key)?;
        match parse_date(&value) {
            Some(date) => Some((value, date)),
            None => {
                issues.push(ExtractionIssue::new(
                    format!("{label}.{key}"),
                    format!("'{value}' is not a date"),
                ));
                None
            }
        }
    };

    let start = bound("start");
    let end = bound("end");

    if let (Some((_, s)), Some((_, e))) = (&start, &end) {
        if e < s {
            issues.push(ExtractionIssue::new(label, "period ends before it starts"));
        }
    }

    if start.is_none() && end.is_none() {
        return (None, issues);
    }

    (
        Some(Period {
            start: start.map(|(raw, _)| raw),
            end: end.map(|(raw, _)| raw),
        }),
        issues,
    )
}

fn period_at(raw: &Value, field: &str) -> Extracted<Option<Period>> {
    match raw.get(field) {
        None | Some(Value::Null) => (None, Vec::new()),
        Some(item) => period(item, field),
    }
}

fn qualifications(raw: &Value) -> Extracted<Vec<Qualification>> {
    let mut issues = Vec::new();
    let mut found = Vec::new();

    for (label, item) in labelled_items("qualification", raw.get("qualification")) {
        let code_label = format!("{label}.code");
        let Some(code_node) = item.get("code") else {
            issues.push(ExtractionIssue::new(code_label, "qualification has no code"));
            continue;
        };

        let code = match coded_value(code_node, &code_label) {
            Ok(code) => code,
            Err(issue) => {
                issues.push(issue);
                continue;
            }
        };

        let issuer = match item.get("issuer") {
            None | Some(Value::Null) => None,
            Some(node) => match reference(node, &format!("{label}.issuer")) {
                Ok(found) => Some(found),
                Err(issue) => {
                    issues.push(issue);
                    None
                }
            },
        };

        let period = match item.get("period") {
            None | Some(Value::Null) => None,
            Some(node) => {
                let (found, period_issues) = period(node, &format!("{label}.period"));
                issues.extend(period_issues);
                found
            }
        };

        found.push(Qualification {
            code,
            issuer,
            period,
        });
    }

    (found, issues)
}

fn communications(raw: &Value) -> Extracted<Vec<Communication>> {
    let mut issues = Vec::new();
    let mut found = Vec::new();

    for (label, item) in labelled_items("communication", raw.get("communication")) {
        // Either {language, preferred} or a bare CodeableConcept.
        let (node, node_label) = match item.get("language") {
            Some(language) => (language, format!("{label}.language")),
            None => (item, label.clone()),
        };

        match coded_value(node, &node_label) {
            Ok(language) => found.push(Communication {
                language,
                preferred: bool_at(item, "preferred").unwrap_or(false),
            }),
            Err(issue) => issues.push(issue),
        }
    }

    (found, issues)
}

fn aliases(raw: &Value) -> Extracted<Vec<String>> {
    let mut issues = Vec::new();
    let mut found = Vec::new();

    for (label, item) in labelled_items("alias", raw.get("alias")) {
        match item.as_str().map(str::trim) {
            Some(alias) if !alias.is_empty() => found.push(alias.to_owned()),
            Some(_) => {}
            None => issues.push(ExtractionIssue::new(label, "alias is not text")),
        }
    }

    (found, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SNOMED_CT_OID;
    use crate::diagnostics::DiagnosticKind;
    use serde_json::json;

    fn organization() -> Value {
        json!({
            "resourceType": "Organization",
            "id": "org-1",
            "active": true,
            "name": "Centro de Saúde de Lisboa",
            "alias": ["CS Lisboa", "  "],
            "identifier": [{"system": "urn:oid:2.16.620.1.101.10.1", "value": "12345"}],
            "type": [
                {"text": "broken, no coding"},
                {"coding": [{"system": "http://snomed.info/sct", "code": "22232009", "display": "Hospital"}]}
            ],
            "telecom": [
                {"system": "phone", "value": "+351 210 000 000", "use": "work"},
                {"system": "email", "value": "geral@cs-lisboa.pt"},
                {"system": "pager", "value": "123"}
            ],
            "address": [{"line": ["Rua da Saúde 1"], "city": "Lisboa", "postalCode": "1000-001", "country": "PT"}],
            "partOf": {"reference": "Organization/parent", "display": "ARS Lisboa"}
        })
    }

    #[test]
    fn assembles_organization() {
        let mut diagnostics = Diagnostics::new();
        let entity =
            assemble_aggregate(ResourceKind::Organization, &organization(), &mut diagnostics);

        assert_eq!(entity.id.as_deref(), Some("org-1"));
        assert_eq!(entity.name.as_deref(), Some("Centro de Saúde de Lisboa"));
        assert_eq!(entity.active, Some(true));
        assert_eq!(entity.aliases, vec!["CS Lisboa"]);
        assert_eq!(entity.identifiers.len(), 1);
        assert_eq!(entity.types.len(), 1);
        assert_eq!(entity.types[0].code_system, SNOMED_CT_OID);
        assert_eq!(entity.telecoms.len(), 2);
        assert_eq!(entity.telecoms[0].system, TelecomSystem::Phone);
        assert_eq!(entity.telecoms[0].use_type.as_deref(), Some("work"));
        assert_eq!(entity.addresses[0].city.as_deref(), Some("Lisboa"));
        assert_eq!(
            entity.part_of.as_ref().and_then(|r| r.display.as_deref()),
            Some("ARS Lisboa")
        );

        // One broken type entry, one unsupported telecom system.
        assert_eq!(
            diagnostics.of_kind(DiagnosticKind::ExtractionWarning).count(),
            2
        );
    }

    #[test]
    fn assembly_is_idempotent() {
        let raw = organization();
        let first = assemble_aggregate(ResourceKind::Organization, &raw, &mut Diagnostics::new());
        let second = assemble_aggregate(ResourceKind::Organization, &raw, &mut Diagnostics::new());
        assert_eq!(first, second);
    }

    #[test]
    fn corrupt_qualification_does_not_affect_telecom() {
        let raw = json!({
            "resourceType": "Practitioner",
            "name": [{"family": "Silva", "given": ["Ana"], "prefix": ["Dr."]}],
            "qualification": [
                {"code": "not a concept"},
                {"issuer": {"display": "Ordem dos Médicos"}},
                {
                    "code": {"coding": [{"system": "urn:oid:2.16.840.1.113883.2.9.6.2.7", "code": "221", "display": "Médico"}]},
                    "issuer": "Ordem",
                    "period": {"start": "2010-02-30"}
                }
            ],
            "telecom": [{"system": "phone", "value": "+351 912 345 678"}]
        });
        let mut diagnostics = Diagnostics::new();
        let entity = assemble_aggregate(ResourceKind::Practitioner, &raw, &mut diagnostics);

        assert_eq!(entity.name.as_deref(), Some("Dr. Ana Silva"));
        assert_eq!(entity.telecoms.len(), 1);
        assert_eq!(entity.telecoms[0].value, "+351 912 345 678");

        assert_eq!(entity.qualifications.len(), 1);
        assert_eq!(entity.qualifications[0].code.code, "221");
        assert!(entity.qualifications[0].issuer.is_none());
        assert!(entity.qualifications[0].period.is_none());

        let fields: Vec<_> = diagnostics
            .records()
            .iter()
            .filter_map(|r| r.field.as_deref())
            .collect();
        assert_eq!(
            fields,
            vec![
                "qualification[0].code",
                "qualification[1].code",
                "qualification[2].issuer",
                "qualification[2].period.start",
            ]
        );
    }

    #[test]
    fn missing_sub_fields_degrade_to_empty() {
        let mut diagnostics = Diagnostics::new();
        let entity = assemble_aggregate(
            ResourceKind::Practitioner,
            &json!({"resourceType": "Practitioner"}),
            &mut diagnostics,
        );

        assert_eq!(entity, AggregateEntity::empty(ResourceKind::Practitioner));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn non_mapping_resource_yields_empty_aggregate() {
        let mut diagnostics = Diagnostics::new();
        let entity =
            assemble_aggregate(ResourceKind::Organization, &json!([1, 2]), &mut diagnostics);
        assert_eq!(entity, AggregateEntity::empty(ResourceKind::Organization));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn reads_cda_flavoured_fields() {
        let raw = json!({
            "identifier": {"root": "2.16.620.1.101.10.3", "extension": "C-991"},
            "telecom": [{"value": "tel:+351210000000", "use": "WP"}, {"value": "mailto:dr@example.pt"}],
            "addr": {"streetAddressLine": ["Avenida 2"], "city": "Porto"},
            "name": {"given": "Rui", "family": "Costa"}
        });
        let mut diagnostics = Diagnostics::new();
        let entity = assemble_aggregate(ResourceKind::Practitioner, &raw, &mut diagnostics);

        assert_eq!(entity.identifiers[0].system.as_deref(), Some("2.16.620.1.101.10.3"));
        assert_eq!(entity.identifiers[0].value, "C-991");
        assert_eq!(entity.telecoms[0].system, TelecomSystem::Phone);
        assert_eq!(entity.telecoms[0].value, "+351210000000");
        assert_eq!(entity.telecoms[1].system, TelecomSystem::Email);
        assert_eq!(entity.telecoms[1].value, "dr@example.pt");
        assert_eq!(entity.addresses[0].lines, vec!["Avenida 2"]);
        assert_eq!(entity.name.as_deref(), Some("Rui Costa"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn related_person_relationship_period_and_languages() {
        let raw = json!({
            "resourceType": "RelatedPerson",
            "relationship": [{"coding": [{"system": "http://terminology.hl7.org/CodeSystem/v3-RoleCode", "code": "MTH", "display": "mother"}]}],
            "period": {"start": "2020", "end": "2019-05"},
            "communication": [
                {"language": {"coding": [{"system": "urn:ietf:bcp:47", "code": "pt"}]}, "preferred": true},
                {"coding": [{"system": "urn:ietf:bcp:47", "code": "en"}]}
            ]
        });
        let mut diagnostics = Diagnostics::new();
        let entity = assemble_aggregate(ResourceKind::RelatedPerson, &raw, &mut diagnostics);

        assert_eq!(entity.relationships[0].code, "MTH");
        assert_eq!(
            entity.period,
            Some(Period {
                start: Some("2020".into()),
                end: Some("2019-05".into())
            })
        );
        assert_eq!(entity.communications.len(), 2);
        assert!(entity.communications[0].preferred);
        assert!(!entity.communications[1].preferred);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.records()[0].message.contains("ends before"));
    }

    #[test]
    fn resource_type_mismatch_is_reported_but_assembled() {
        let mut diagnostics = Diagnostics::new();
        let entity = assemble_aggregate(
            ResourceKind::Organization,
            &json!({"resourceType": "Practitioner", "name": "Oops"}),
            &mut diagnostics,
        );
        assert_eq!(entity.name.as_deref(), Some("Oops"));
        assert_eq!(diagnostics.records()[0].field.as_deref(), Some("resourceType"));
    }

    #[test]
    fn parses_partial_and_full_dates() {
        assert!(parse_date("2020").is_some());
        assert!(parse_date("2020-06").is_some());
        assert!(parse_date("2020-06-15").is_some());
        assert!(parse_date("2020-06-15T10:00:00+01:00").is_some());
        assert!(parse_date("2020-13").is_none());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn resource_kind_round_trips_resource_type() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_resource_type(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::from_resource_type("Patient"), None);
    }
}
