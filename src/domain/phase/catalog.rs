//! PhaseSequence - Centralized ordering logic for the phase catalog.
//!
//! The testing workflow has a defined progression through 8 phases. This
//! module consolidates all ordering logic into a single location so no
//! caller re-derives "which phase comes next" ad hoc.
//!
//! # Phase Order
//!
//! 1. Planning, 2. Scoping, 3. SampleSelection,
//! 4. DataOwnerIdentification, 5. RequestForInformation,
//! 6. TestExecution, 7. ObservationManagement, 8. TestReport

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// The fixed catalog of testing phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    Planning,
    Scoping,
    SampleSelection,
    DataOwnerIdentification,
    RequestForInformation,
    TestExecution,
    ObservationManagement,
    TestReport,
}

impl PhaseName {
    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Planning => "planning",
            PhaseName::Scoping => "scoping",
            PhaseName::SampleSelection => "sample_selection",
            PhaseName::DataOwnerIdentification => "data_owner_identification",
            PhaseName::RequestForInformation => "request_for_information",
            PhaseName::TestExecution => "test_execution",
            PhaseName::ObservationManagement => "observation_management",
            PhaseName::TestReport => "test_report",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhaseName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseSequence::all()
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| {
                ValidationError::invalid_format("phase", format!("unknown phase '{}'", s))
            })
    }
}

/// Central location for phase ordering logic.
///
/// All ordering-related queries go through this type; the order is a fixed
/// catalog, not user-defined.
pub struct PhaseSequence;

impl PhaseSequence {
    /// The canonical order of testing phases.
    pub const ORDER: [PhaseName; 8] = [
        PhaseName::Planning,
        PhaseName::Scoping,
        PhaseName::SampleSelection,
        PhaseName::DataOwnerIdentification,
        PhaseName::RequestForInformation,
        PhaseName::TestExecution,
        PhaseName::ObservationManagement,
        PhaseName::TestReport,
    ];

    /// Returns all phases in order.
    pub fn all() -> &'static [PhaseName; 8] {
        &Self::ORDER
    }

    /// Returns the 0-based index of a phase in the sequence.
    #[inline]
    pub fn order_index(phase: PhaseName) -> usize {
        Self::ORDER
            .iter()
            .position(|&p| p == phase)
            .expect("All PhaseName variants must be in ORDER")
    }

    /// Returns the next phase in the sequence, or None if at the end.
    pub fn next(phase: PhaseName) -> Option<PhaseName> {
        let idx = Self::order_index(phase);
        Self::ORDER.get(idx + 1).copied()
    }

    /// Returns the previous phase in the sequence, or None if at the start.
    pub fn previous(phase: PhaseName) -> Option<PhaseName> {
        let idx = Self::order_index(phase);
        if idx > 0 {
            Self::ORDER.get(idx - 1).copied()
        } else {
            None
        }
    }

    /// Returns the predecessor that must be Complete before this phase may
    /// enter InProgress. Alias for `previous()` that makes the gate intent
    /// clear in business logic.
    pub fn predecessor(phase: PhaseName) -> Option<PhaseName> {
        Self::previous(phase)
    }

    /// Returns true if phase `a` comes before phase `b` in the sequence.
    pub fn is_before(a: PhaseName, b: PhaseName) -> bool {
        Self::order_index(a) < Self::order_index(b)
    }

    /// Returns the first phase in the sequence.
    pub fn first() -> PhaseName {
        Self::ORDER[0]
    }

    /// Returns the last phase in the sequence.
    pub fn last() -> PhaseName {
        Self::ORDER[Self::ORDER.len() - 1]
    }

    /// Returns true if this is the first phase in the sequence.
    pub fn is_first(phase: PhaseName) -> bool {
        phase == Self::first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_contains_all_eight_phases() {
        assert_eq!(PhaseSequence::ORDER.len(), 8);
    }

    #[test]
    fn order_index_returns_catalog_position() {
        assert_eq!(PhaseSequence::order_index(PhaseName::Planning), 0);
        assert_eq!(PhaseSequence::order_index(PhaseName::Scoping), 1);
        assert_eq!(PhaseSequence::order_index(PhaseName::TestExecution), 5);
        assert_eq!(PhaseSequence::order_index(PhaseName::TestReport), 7);
    }

    #[test]
    fn next_returns_subsequent_phase() {
        assert_eq!(
            PhaseSequence::next(PhaseName::Planning),
            Some(PhaseName::Scoping)
        );
        assert_eq!(
            PhaseSequence::next(PhaseName::ObservationManagement),
            Some(PhaseName::TestReport)
        );
    }

    #[test]
    fn next_returns_none_for_last_phase() {
        assert_eq!(PhaseSequence::next(PhaseName::TestReport), None);
    }

    #[test]
    fn previous_returns_none_for_first_phase() {
        assert_eq!(PhaseSequence::previous(PhaseName::Planning), None);
    }

    #[test]
    fn predecessor_is_alias_for_previous() {
        assert_eq!(
            PhaseSequence::predecessor(PhaseName::Scoping),
            Some(PhaseName::Planning)
        );
    }

    #[test]
    fn is_before_compares_catalog_order() {
        assert!(PhaseSequence::is_before(
            PhaseName::Scoping,
            PhaseName::TestExecution
        ));
        assert!(!PhaseSequence::is_before(
            PhaseName::TestReport,
            PhaseName::Planning
        ));
        assert!(!PhaseSequence::is_before(
            PhaseName::Scoping,
            PhaseName::Scoping
        ));
    }

    #[test]
    fn first_and_last_bracket_the_catalog() {
        assert_eq!(PhaseSequence::first(), PhaseName::Planning);
        assert_eq!(PhaseSequence::last(), PhaseName::TestReport);
        assert!(PhaseSequence::is_first(PhaseName::Planning));
        assert!(!PhaseSequence::is_first(PhaseName::Scoping));
    }

    #[test]
    fn as_str_round_trips_through_from_str() {
        for phase in PhaseSequence::all() {
            let parsed: PhaseName = phase.as_str().parse().unwrap();
            assert_eq!(parsed, *phase);
        }
    }

    #[test]
    fn serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&PhaseName::SampleSelection).unwrap(),
            "\"sample_selection\""
        );
    }
}
