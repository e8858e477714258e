//! Phase state and manual overrides.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{StateMachine, Timestamp, UserId};

/// Lifecycle state of a phase, derived from its activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl PhaseState {
    /// Returns true if work has begun on this phase.
    pub fn is_started(&self) -> bool {
        !matches!(self, PhaseState::NotStarted)
    }

    /// Returns true if the phase is finished.
    pub fn is_complete(&self) -> bool {
        matches!(self, PhaseState::Complete)
    }

    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseState::NotStarted => "not_started",
            PhaseState::InProgress => "in_progress",
            PhaseState::Complete => "complete",
        }
    }
}

impl StateMachine for PhaseState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use PhaseState::*;
        matches!((self, target), (NotStarted, InProgress) | (InProgress, Complete))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use PhaseState::*;
        match self {
            NotStarted => vec![InProgress],
            InProgress => vec![Complete],
            Complete => vec![],
        }
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A manual admin correction of a computed phase value.
///
/// Overrides win over the computed value for display and gating, but never
/// rewrite the underlying activity or version records. Reason and actor are
/// mandatory so every override is auditable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOverride<T> {
    pub value: T,
    pub reason: String,
    pub actor: UserId,
    pub at: Timestamp,
}

impl<T> PhaseOverride<T> {
    /// Creates an override with its audit trail.
    pub fn new(value: T, reason: impl Into<String>, actor: UserId, at: Timestamp) -> Self {
        Self {
            value,
            reason: reason.into(),
            actor,
            at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_started() {
        assert_eq!(PhaseState::default(), PhaseState::NotStarted);
    }

    #[test]
    fn linear_transitions_are_valid() {
        assert!(PhaseState::NotStarted.can_transition_to(&PhaseState::InProgress));
        assert!(PhaseState::InProgress.can_transition_to(&PhaseState::Complete));
    }

    #[test]
    fn skipping_or_reversing_is_invalid() {
        assert!(!PhaseState::NotStarted.can_transition_to(&PhaseState::Complete));
        assert!(!PhaseState::Complete.can_transition_to(&PhaseState::InProgress));
        assert!(!PhaseState::InProgress.can_transition_to(&PhaseState::NotStarted));
    }

    #[test]
    fn complete_is_terminal() {
        assert!(PhaseState::Complete.is_terminal());
        assert!(!PhaseState::InProgress.is_terminal());
    }

    #[test]
    fn override_keeps_audit_fields() {
        let actor = UserId::new("admin-1").unwrap();
        let at = Timestamp::now();
        let ov = PhaseOverride::new(PhaseState::Complete, "migration backfill", actor.clone(), at);
        assert_eq!(ov.value, PhaseState::Complete);
        assert_eq!(ov.reason, "migration backfill");
        assert_eq!(ov.actor, actor);
        assert_eq!(ov.at, at);
    }

    #[test]
    fn serializes_to_snake_case() {
        assert_eq!(
            serde_json::to_string(&PhaseState::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
