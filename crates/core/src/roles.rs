//! Role and specialty derivation from a practitioner's qualifications.
//!
//! Documents carry no code telling a role apart from a specialty, so the default
//! [`PositionalClassifier`] goes by list order. It sits behind [`QualificationClassifier`]
//! so a semantic classifier can replace it without touching the resolution engine.

use crate::aggregate::Qualification;

/// Indices into a qualification list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role: Option<usize>,
    pub specialty: Option<usize>,
}

pub trait QualificationClassifier: Send + Sync {
    /// Pick the primary role and the specialty out of `qualifications`.
    fn classify(&self, qualifications: &[Qualification]) -> RoleAssignment;
}

/// First qualification is the role; the next one with a different code is the specialty.
#[derive(Clone, Copy, Debug, Default)]
pub struct PositionalClassifier;

impl QualificationClassifier for PositionalClassifier {
    fn classify(&self, qualifications: &[Qualification]) -> RoleAssignment {
        let Some(first) = qualifications.first() else {
            return RoleAssignment::default();
        };

        let specialty = qualifications
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, q)| {
                q.code.code != first.code.code || q.code.code_system != first.code.code_system
            })
            .map(|(i, _)| i);

        RoleAssignment {
            role: Some(0),
            specialty,
        }
    }
}
