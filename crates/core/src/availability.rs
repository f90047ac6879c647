//! Degradation reporting for whole resource classes.
//!
//! When a resource kind the document should carry yields no entities, the presentation layer
//! gets an [`UnavailabilityMarker`] to render instead of an empty table.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::{TerminologyError, TerminologyResult};
use ncp_types::NonEmptyText;
use serde::Serialize;

/// Per-kind availability within one pass. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityState {
    Pending,
    Extracted,
    Available,
    Unavailable,
}

impl AvailabilityState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AvailabilityState::Available | AvailabilityState::Unavailable)
    }
}

/// Tracks one resource kind through `PENDING → EXTRACTED → AVAILABLE | UNAVAILABLE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AvailabilityTracker {
    resource_kind: String,
    state: AvailabilityState,
    entity_count: usize,
}

impl AvailabilityTracker {
    pub fn new(resource_kind: impl Into<String>) -> Self {
        Self {
            resource_kind: resource_kind.into(),
            state: AvailabilityState::Pending,
            entity_count: 0,
        }
    }

    pub fn state(&self) -> AvailabilityState {
        self.state
    }

    pub fn resource_kind(&self) -> &str {
        &self.resource_kind
    }

    /// Record that extraction finished with `entity_count` entities.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::InvalidInput`] unless the tracker is `PENDING`.
    pub fn extracted(&mut self, entity_count: usize) -> TerminologyResult<()> {
        if self.state != AvailabilityState::Pending {
            return Err(self.bad_transition(AvailabilityState::Extracted));
        }
        self.entity_count = entity_count;
        self.state = AvailabilityState::Extracted;
        Ok(())
    }

    /// Move to the terminal state implied by the extracted count.
    ///
    /// # Errors
    ///
    /// Returns [`TerminologyError::InvalidInput`] unless the tracker is `EXTRACTED`.
    pub fn conclude(&mut self) -> TerminologyResult<AvailabilityState> {
        let next = if self.entity_count > 0 {
            AvailabilityState::Available
        } else {
            AvailabilityState::Unavailable
        };

        if self.state != AvailabilityState::Extracted {
            return Err(self.bad_transition(next));
        }
        self.state = next;
        Ok(next)
    }

    fn bad_transition(&self, to: AvailabilityState) -> TerminologyError {
        TerminologyError::InvalidInput(format!(
            "{}: cannot move from {:?} to {:?}",
            self.resource_kind, self.state, to
        ))
    }
}

/// Placeholder for a resource kind the document did not supply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailabilityMarker {
    pub resource_kind: String,
    pub reason: NonEmptyText,
    pub available: bool,
}

/// Marker for `resource_kind` if `entities` is empty, otherwise `None`.
///
/// A blank `reason` is replaced by a generic one. Each detection records one
/// [`DiagnosticKind::ResourceClassAbsent`] warning; calling again with the same input gives
/// an equal marker.
pub fn check_availability<T>(
    entities: &[T],
    resource_kind: &str,
    reason: &str,
    diagnostics: &mut Diagnostics,
) -> Option<UnavailabilityMarker> {
    if !entities.is_empty() {
        return None;
    }

    let default_reason = format!("No {resource_kind} information was provided in this document");
    let reason = NonEmptyText::with_fallback(reason, &default_reason);

    diagnostics.push(
        DiagnosticKind::ResourceClassAbsent,
        Some(resource_kind),
        None,
        reason.as_str(),
    );

    Some(UnavailabilityMarker {
        resource_kind: resource_kind.to_owned(),
        reason,
        available: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregateEntity, ResourceKind};

    #[test]
    fn empty_entities_yield_a_marker() {
        let mut diagnostics = Diagnostics::new();
        let marker = check_availability::<AggregateEntity>(
            &[],
            "Practitioner",
            "Practitioner information was not provided",
            &mut diagnostics,
        )
        .expect("marker");

        assert_eq!(marker.resource_kind, "Practitioner");
        assert!(!marker.available);
        assert_eq!(marker.reason.as_str(), "Practitioner information was not provided");
        assert_eq!(diagnostics.of_kind(DiagnosticKind::ResourceClassAbsent).count(), 1);
    }

    #[test]
    fn present_entities_yield_nothing() {
        let mut diagnostics = Diagnostics::new();
        let entities = [AggregateEntity::empty(ResourceKind::Practitioner)];

        let marker = check_availability(&entities, "Practitioner", "reason", &mut diagnostics);
        assert!(marker.is_none());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn repeated_checks_are_equivalent() {
        let mut diagnostics = Diagnostics::new();
        let none: [AggregateEntity; 0] = [];
        let first = check_availability(&none, "Organization", "", &mut diagnostics);
        let second = check_availability(&none, "Organization", "", &mut diagnostics);

        assert_eq!(first, second);
        let marker = first.expect("marker");
        assert!(marker.reason.as_str().contains("Organization"));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn marker_serialises_for_presentation() {
        let marker = check_availability::<AggregateEntity>(
            &[],
            "Practitioner",
            "not supplied",
            &mut Diagnostics::new(),
        )
        .expect("marker");

        let json = serde_json::to_value(&marker).expect("serialise");
        assert_eq!(json["resourceKind"], "Practitioner");
        assert_eq!(json["available"], false);
        assert_eq!(json["reason"], "not supplied");
    }

    #[test]
    fn tracker_walks_to_a_terminal_state() {
        let mut tracker = AvailabilityTracker::new("Practitioner");
        assert_eq!(tracker.state(), AvailabilityState::Pending);

        tracker.extracted(0).expect("pending to extracted");
        assert_eq!(
            tracker.conclude().expect("extracted to terminal"),
            AvailabilityState::Unavailable
        );
        assert!(tracker.state().is_terminal());

        assert!(tracker.extracted(1).is_err());
        assert!(tracker.conclude().is_err());
    }

    #[test]
    fn tracker_cannot_conclude_before_extraction() {
        let mut tracker = AvailabilityTracker::new("Organization");
        let err = tracker.conclude().expect_err("should refuse");
        assert!(matches!(err, TerminologyError::InvalidInput(_)));

        tracker.extracted(2).expect("pending to extracted");
        assert_eq!(tracker.conclude().expect("terminal"), AvailabilityState::Available);
    }
}
