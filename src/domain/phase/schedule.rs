//! Schedule health - SLA policy and the OnTrack/AtRisk/PastDue axis.
//!
//! Schedule status is an independent axis from phase state: a phase can be
//! InProgress and PastDue at the same time. Status is recomputed lazily
//! from the phase's due date whenever the phase is read or advanced, so a
//! caller-side periodic sweep needs no extra machinery.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::PhaseName;
use crate::domain::foundation::Timestamp;

/// Schedule health of a phase relative to its SLA due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    #[default]
    OnTrack,
    AtRisk,
    PastDue,
}

impl ScheduleStatus {
    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::OnTrack => "on_track",
            ScheduleStatus::AtRisk => "at_risk",
            ScheduleStatus::PastDue => "past_due",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-phase SLA durations plus the at-risk warning window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaPolicy {
    phase_days: HashMap<PhaseName, i64>,
    default_days: i64,
    warning_days: i64,
}

/// Default SLA table. TestExecution gets the longest runway; the warning
/// window opens three days before a due date.
static DEFAULT_POLICY: Lazy<SlaPolicy> = Lazy::new(|| {
    SlaPolicy::new(
        [
            (PhaseName::Planning, 7),
            (PhaseName::Scoping, 7),
            (PhaseName::SampleSelection, 7),
            (PhaseName::DataOwnerIdentification, 5),
            (PhaseName::RequestForInformation, 10),
            (PhaseName::TestExecution, 14),
            (PhaseName::ObservationManagement, 7),
            (PhaseName::TestReport, 7),
        ]
        .into_iter()
        .collect(),
        7,
        3,
    )
});

impl SlaPolicy {
    /// Creates a policy from explicit per-phase durations.
    pub fn new(phase_days: HashMap<PhaseName, i64>, default_days: i64, warning_days: i64) -> Self {
        Self {
            phase_days,
            default_days,
            warning_days,
        }
    }

    /// Creates a uniform policy, mainly for tests.
    pub fn uniform(days: i64, warning_days: i64) -> Self {
        Self {
            phase_days: HashMap::new(),
            default_days: days,
            warning_days,
        }
    }

    /// Returns the built-in default table.
    pub fn default_table() -> &'static SlaPolicy {
        &DEFAULT_POLICY
    }

    /// SLA duration in days for a phase.
    pub fn days_for(&self, phase: PhaseName) -> i64 {
        self.phase_days.get(&phase).copied().unwrap_or(self.default_days)
    }

    /// The due date for a phase unlocked at `unlocked_at`.
    pub fn due_date(&self, phase: PhaseName, unlocked_at: Timestamp) -> Timestamp {
        unlocked_at.add_days(self.days_for(phase))
    }

    /// Assesses schedule health against a due date.
    ///
    /// A phase with no due date (never unlocked) and a completed phase are
    /// both OnTrack: past-due pressure only applies to open work.
    pub fn assess(&self, due_at: Option<Timestamp>, complete: bool, now: Timestamp) -> ScheduleStatus {
        let Some(due) = due_at else {
            return ScheduleStatus::OnTrack;
        };
        if complete {
            return ScheduleStatus::OnTrack;
        }
        if now.is_after(&due) {
            ScheduleStatus::PastDue
        } else if !now.is_before(&due.minus_days(self.warning_days)) {
            ScheduleStatus::AtRisk
        } else {
            ScheduleStatus::OnTrack
        }
    }
}

impl Default for SlaPolicy {
    fn default() -> Self {
        DEFAULT_POLICY.clone()
    }
}
