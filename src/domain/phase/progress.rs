//! PhaseProgress value object - completion tracking for one phase.

use serde::{Deserialize, Serialize};

use super::Activity;

/// A snapshot of activity completion within a phase.
///
/// Read-only value object; percent is computed over required (non-optional)
/// activities only, so skipping an optional review cannot hold a phase at
/// less than 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseProgress {
    required_total: u8,
    required_complete: u8,
    optional_complete: u8,
    any_started: bool,
}

impl PhaseProgress {
    /// Computes progress from a phase's activity list.
    pub fn from_activities(activities: &[Activity]) -> Self {
        let required: Vec<_> = activities.iter().filter(|a| !a.is_optional()).collect();
        Self {
            required_total: required.len() as u8,
            required_complete: required.iter().filter(|a| a.status().is_complete()).count() as u8,
            optional_complete: activities
                .iter()
                .filter(|a| a.is_optional() && a.status().is_complete())
                .count() as u8,
            any_started: activities.iter().any(|a| a.status().is_started()),
        }
    }

    /// Number of required activities in the phase.
    pub fn required_total(&self) -> u8 {
        self.required_total
    }

    /// Number of required activities already complete.
    pub fn required_complete(&self) -> u8 {
        self.required_complete
    }

    /// Number of optional activities already complete.
    pub fn optional_complete(&self) -> u8 {
        self.optional_complete
    }

    /// True if any activity (optional included) has been started.
    pub fn any_started(&self) -> bool {
        self.any_started
    }

    /// True if every required activity is complete.
    pub fn all_required_complete(&self) -> bool {
        self.required_complete == self.required_total
    }

    /// Completion percentage over required activities (0-100).
    pub fn percent(&self) -> u8 {
        if self.required_total == 0 {
            return 100;
        }
        ((self.required_complete as u16 * 100) / self.required_total as u16) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::phase::{ActivityTemplate, PhaseName};

    fn activities() -> Vec<Activity> {
        ActivityTemplate::for_phase(PhaseName::TestExecution)
            .iter()
            .enumerate()
            .map(|(i, t)| Activity::from_template(t, (i + 1) as u8))
            .collect()
    }

    fn actor() -> UserId {
        UserId::new("tester-1").unwrap()
    }

    #[test]
    fn fresh_phase_has_zero_percent() {
        let progress = PhaseProgress::from_activities(&activities());
        assert_eq!(progress.percent(), 0);
        assert!(!progress.any_started());
        assert!(!progress.all_required_complete());
    }

    #[test]
    fn percent_counts_only_required_activities() {
        let mut acts = activities();
        // TestExecution has 4 required + 1 optional review.
        assert_eq!(PhaseProgress::from_activities(&acts).required_total(), 4);

        acts[0].mark_completed(&actor(), Timestamp::now());
        acts[1].mark_completed(&actor(), Timestamp::now());
        let progress = PhaseProgress::from_activities(&acts);
        assert_eq!(progress.percent(), 50);
        assert!(progress.any_started());
    }

    #[test]
    fn optional_completion_does_not_move_percent() {
        let mut acts = activities();
        let optional_idx = acts.iter().position(|a| a.is_optional()).unwrap();
        acts[optional_idx].mark_completed(&actor(), Timestamp::now());
        let progress = PhaseProgress::from_activities(&acts);
        assert_eq!(progress.percent(), 0);
        assert_eq!(progress.optional_complete(), 1);
    }

    #[test]
    fn all_required_complete_ignores_optional() {
        let mut acts = activities();
        for a in acts.iter_mut().filter(|a| !a.is_optional()) {
            a.mark_completed(&actor(), Timestamp::now());
        }
        let progress = PhaseProgress::from_activities(&acts);
        assert!(progress.all_required_complete());
        assert_eq!(progress.percent(), 100);
    }

    #[test]
    fn empty_activity_list_is_fully_complete() {
        let progress = PhaseProgress::from_activities(&[]);
        assert_eq!(progress.percent(), 100);
        assert!(progress.all_required_complete());
    }
}
