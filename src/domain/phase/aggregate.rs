//! ReportWorkflow aggregate - the root entity for one cycle x report pairing.
//!
//! Owns all eight phases and their activities. Phase ordering and the
//! activity gate are enforced here, so no caller can move a report through
//! phases out of order or skip required activities.

use serde::{Deserialize, Serialize};

use super::{
    Activity, ActivityTemplate, ActivityType, PhaseName, PhaseOverride, PhaseProgress,
    PhaseSequence, PhaseState, ScheduleStatus, SlaPolicy, WorkflowEvent,
};
use crate::domain::foundation::{
    ActivityId, CycleId, DomainError, ErrorCode, ReportId, Timestamp, UserId, WorkflowId,
};

/// One phase of the workflow, owned by [`ReportWorkflow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    name: PhaseName,
    state: PhaseState,
    state_override: Option<PhaseOverride<PhaseState>>,
    status_override: Option<PhaseOverride<ScheduleStatus>>,
    actual_start: Option<Timestamp>,
    actual_end: Option<Timestamp>,
    /// Stamped when the phase is unlocked; doubles as the unlock marker.
    due_at: Option<Timestamp>,
    activities: Vec<Activity>,
}

impl Phase {
    /// Creates a fresh phase with its full activity set seeded from the
    /// catalog template.
    pub fn new(name: PhaseName) -> Self {
        let activities = ActivityTemplate::for_phase(name)
            .iter()
            .enumerate()
            .map(|(i, t)| Activity::from_template(t, (i + 1) as u8))
            .collect();
        Self {
            name,
            state: PhaseState::NotStarted,
            state_override: None,
            status_override: None,
            actual_start: None,
            actual_end: None,
            due_at: None,
            activities,
        }
    }

    /// Reconstitutes a phase from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        name: PhaseName,
        state: PhaseState,
        state_override: Option<PhaseOverride<PhaseState>>,
        status_override: Option<PhaseOverride<ScheduleStatus>>,
        actual_start: Option<Timestamp>,
        actual_end: Option<Timestamp>,
        due_at: Option<Timestamp>,
        activities: Vec<Activity>,
    ) -> Self {
        Self {
            name,
            state,
            state_override,
            status_override,
            actual_start,
            actual_end,
            due_at,
            activities,
        }
    }

    pub fn name(&self) -> PhaseName {
        self.name
    }

    /// Raw computed state, ignoring any override.
    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// State with the override applied, if one is set.
    pub fn effective_state(&self) -> PhaseState {
        self.state_override
            .as_ref()
            .map(|o| o.value)
            .unwrap_or(self.state)
    }

    pub fn state_override(&self) -> Option<&PhaseOverride<PhaseState>> {
        self.state_override.as_ref()
    }

    pub fn status_override(&self) -> Option<&PhaseOverride<ScheduleStatus>> {
        self.status_override.as_ref()
    }

    pub fn actual_start(&self) -> Option<Timestamp> {
        self.actual_start
    }

    pub fn actual_end(&self) -> Option<Timestamp> {
        self.actual_end
    }

    pub fn due_at(&self) -> Option<Timestamp> {
        self.due_at
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Looks up an activity by id.
    pub fn activity(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id() == id)
    }

    fn activity_mut(&mut self, id: ActivityId) -> Option<&mut Activity> {
        self.activities.iter_mut().find(|a| a.id() == id)
    }

    /// Progress over this phase's activities.
    pub fn progress(&self) -> PhaseProgress {
        PhaseProgress::from_activities(&self.activities)
    }

    /// Schedule health with the override applied.
    pub fn schedule_status(&self, sla: &SlaPolicy, now: Timestamp) -> ScheduleStatus {
        if let Some(o) = &self.status_override {
            return o.value;
        }
        sla.assess(self.due_at, self.effective_state().is_complete(), now)
    }

    /// True if all activities before `order` that are not optional are
    /// complete. Order 1 is always clear.
    fn predecessors_complete(&self, order: u8) -> bool {
        self.activities
            .iter()
            .filter(|a| a.order() < order && !a.is_optional())
            .all(|a| a.status().is_complete())
    }
}

/// Summary returned by `advance_phase`: the (state, status, progress)
/// triple after recomputation, with overrides applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    pub phase: PhaseName,
    pub state: PhaseState,
    pub status: ScheduleStatus,
    pub progress: PhaseProgress,
}

/// The ReportWorkflow aggregate root.
///
/// Created when a report is added to a cycle; owns the phase records for
/// the full catalog and accumulates domain events for the caller to drain.
#[derive(Debug, Clone)]
pub struct ReportWorkflow {
    id: WorkflowId,
    cycle_id: CycleId,
    report_id: ReportId,
    tester: UserId,
    report_owner: UserId,
    phases: Vec<Phase>,
    created_at: Timestamp,
    updated_at: Timestamp,
    domain_events: Vec<WorkflowEvent>,
}

impl ReportWorkflow {
    /// Creates a new workflow with all phases seeded and the first phase
    /// unlocked (its due date stamped from the SLA policy).
    pub fn new(
        cycle_id: CycleId,
        report_id: ReportId,
        tester: UserId,
        report_owner: UserId,
        sla: &SlaPolicy,
        now: Timestamp,
    ) -> Self {
        let id = WorkflowId::new();
        let mut phases: Vec<Phase> = PhaseSequence::all().iter().map(|p| Phase::new(*p)).collect();

        let first = PhaseSequence::first();
        let due = sla.due_date(first, now);
        phases[0].due_at = Some(due);

        let mut workflow = Self {
            id,
            cycle_id,
            report_id,
            tester,
            report_owner,
            phases,
            created_at: now,
            updated_at: now,
            domain_events: Vec::new(),
        };
        workflow.record_event(WorkflowEvent::PhaseUnlocked {
            workflow_id: id,
            phase: first,
            due_at: due,
        });
        workflow
    }

    /// Reconstitutes a workflow from persisted data.
    ///
    /// Bypasses domain event recording. Phases must be supplied in catalog
    /// order and cover the whole catalog.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: WorkflowId,
        cycle_id: CycleId,
        report_id: ReportId,
        tester: UserId,
        report_owner: UserId,
        phases: Vec<Phase>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Result<Self, DomainError> {
        if phases.len() != PhaseSequence::ORDER.len()
            || phases
                .iter()
                .zip(PhaseSequence::all())
                .any(|(phase, expected)| phase.name() != *expected)
        {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "Persisted workflow does not cover the phase catalog in order",
            ));
        }
        Ok(Self {
            id,
            cycle_id,
            report_id,
            tester,
            report_owner,
            phases,
            created_at,
            updated_at,
            domain_events: Vec::new(),
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn cycle_id(&self) -> CycleId {
        self.cycle_id
    }

    pub fn report_id(&self) -> ReportId {
        self.report_id
    }

    pub fn tester(&self) -> &UserId {
        &self.tester
    }

    pub fn report_owner(&self) -> &UserId {
        &self.report_owner
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Returns the phase record for a catalog entry.
    pub fn phase(&self, name: PhaseName) -> &Phase {
        &self.phases[PhaseSequence::order_index(name)]
    }

    fn phase_mut(&mut self, name: PhaseName) -> &mut Phase {
        &mut self.phases[PhaseSequence::order_index(name)]
    }

    /// Takes accumulated domain events, clearing the internal buffer.
    pub fn take_events(&mut self) -> Vec<WorkflowEvent> {
        std::mem::take(&mut self.domain_events)
    }

    fn record_event(&mut self, event: WorkflowEvent) {
        self.domain_events.push(event);
    }

    // ───────────────────────────────────────────────────────────────
    // Phase ordering gate
    // ───────────────────────────────────────────────────────────────

    /// True if the phase may accept work: it is first in the catalog or
    /// its predecessor is Complete (override counts).
    pub fn phase_unlocked(&self, name: PhaseName) -> bool {
        match PhaseSequence::predecessor(name) {
            None => true,
            Some(prev) => self.phase(prev).effective_state().is_complete(),
        }
    }

    fn require_unlocked(&self, name: PhaseName) -> Result<(), DomainError> {
        if self.phase_unlocked(name) {
            return Ok(());
        }
        let prev = PhaseSequence::predecessor(name).expect("locked phase has a predecessor");
        Err(DomainError::new(
            ErrorCode::PhaseOutOfOrder,
            format!("Cannot work {} before {} is complete", name, prev),
        )
        .with_detail("phase", name.as_str())
        .with_detail("predecessor", prev.as_str()))
    }

    // ───────────────────────────────────────────────────────────────
    // Activity gate
    // ───────────────────────────────────────────────────────────────

    /// Validates that an activity can be started: the phase is unlocked
    /// and every preceding non-optional activity is complete.
    pub fn validate_can_start(
        &self,
        phase: PhaseName,
        activity_id: ActivityId,
    ) -> Result<(), DomainError> {
        self.require_unlocked(phase)?;
        let record = self.phase(phase);
        let activity = record.activity(activity_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::ActivityNotFound,
                format!("No activity {} in {}", activity_id, phase),
            )
        })?;
        if !record.predecessors_complete(activity.order()) {
            return Err(DomainError::new(
                ErrorCode::ActivityOutOfOrder,
                format!(
                    "Cannot start '{}' before earlier required activities complete",
                    activity.name()
                ),
            )
            .with_detail("phase", phase.as_str())
            .with_detail("activity_order", activity.order().to_string()));
        }
        Ok(())
    }

    /// Starts an activity.
    ///
    /// Idempotent: an already-started activity is a successful no-op.
    /// A `start`-type automatic activity transitions straight to Complete
    /// in the same call, so the initialization it represents and its
    /// completion are persisted together or not at all.
    pub fn start_activity(
        &mut self,
        phase: PhaseName,
        activity_id: ActivityId,
        actor: &UserId,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let workflow_id = self.id;
        {
            let record = self.phase(phase);
            if let Some(activity) = record.activity(activity_id) {
                if activity.status().is_started() {
                    return Ok(());
                }
            }
        }
        self.validate_can_start(phase, activity_id)?;

        let phase_was_started = self.phase(phase).state().is_started();
        let record = self.phase_mut(phase);
        let activity = record
            .activity_mut(activity_id)
            .expect("validated activity exists");
        activity.mark_started(actor, now);
        let auto_complete =
            activity.activity_type() == ActivityType::Start && !activity.is_manual();
        if auto_complete {
            activity.mark_completed(actor, now);
        }

        if !phase_was_started {
            record.state = PhaseState::InProgress;
            record.actual_start = Some(now);
            self.record_event(WorkflowEvent::PhaseStarted {
                workflow_id,
                phase,
                at: now,
            });
        }
        self.record_event(WorkflowEvent::ActivityStarted {
            workflow_id,
            phase,
            activity_id,
            actor: actor.clone(),
        });
        if auto_complete {
            self.record_event(WorkflowEvent::ActivityCompleted {
                workflow_id,
                phase,
                activity_id,
                actor: actor.clone(),
            });
        }
        self.updated_at = now;
        Ok(())
    }

    /// Completes an activity.
    ///
    /// Idempotent: completing an already-complete activity is a no-op
    /// success, tolerating retried calls from the orchestration layer.
    /// Completion order follows activity order for non-optional rows.
    pub fn complete_activity(
        &mut self,
        phase: PhaseName,
        activity_id: ActivityId,
        actor: &UserId,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let workflow_id = self.id;
        {
            let record = self.phase(phase);
            if let Some(activity) = record.activity(activity_id) {
                if activity.status().is_complete() {
                    return Ok(());
                }
            }
        }
        self.validate_can_start(phase, activity_id)?;

        let phase_was_started = self.phase(phase).state().is_started();
        let record = self.phase_mut(phase);
        let activity = record
            .activity_mut(activity_id)
            .expect("validated activity exists");
        activity.mark_completed(actor, now);

        if !phase_was_started {
            record.state = PhaseState::InProgress;
            record.actual_start = Some(now);
            self.record_event(WorkflowEvent::PhaseStarted {
                workflow_id,
                phase,
                at: now,
            });
        }
        self.record_event(WorkflowEvent::ActivityCompleted {
            workflow_id,
            phase,
            activity_id,
            actor: actor.clone(),
        });
        self.updated_at = now;
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────
    // Phase state machine
    // ───────────────────────────────────────────────────────────────

    /// Recomputes a phase's state, schedule status, and progress.
    ///
    /// `terminal_version_approved` reflects the phase's artifact: `None`
    /// when the phase has no versions, otherwise whether the chain's
    /// current version is Approved. Completing a phase unlocks the next
    /// phase in the catalog and stamps its due date.
    ///
    /// Fails with `PhaseOutOfOrder` (leaving the phase untouched) when the
    /// predecessor is not Complete and no state override is present.
    pub fn advance_phase(
        &mut self,
        name: PhaseName,
        terminal_version_approved: Option<bool>,
        sla: &SlaPolicy,
        now: Timestamp,
    ) -> Result<PhaseSnapshot, DomainError> {
        if self.phase(name).state_override.is_none() {
            self.require_unlocked(name)?;
        }
        let workflow_id = self.id;

        let progress = self.phase(name).progress();
        let computed = if !progress.any_started() {
            PhaseState::NotStarted
        } else if progress.all_required_complete() && terminal_version_approved.unwrap_or(true) {
            PhaseState::Complete
        } else {
            PhaseState::InProgress
        };

        let was_complete = self.phase(name).state().is_complete();
        {
            let record = self.phase_mut(name);
            record.state = computed;
            if computed.is_complete() && record.actual_end.is_none() {
                record.actual_end = Some(now);
            }
        }

        if computed.is_complete() && !was_complete {
            self.record_event(WorkflowEvent::PhaseCompleted {
                workflow_id,
                phase: name,
                at: now,
            });
            if let Some(next) = PhaseSequence::next(name) {
                let due = sla.due_date(next, now);
                let next_record = self.phase_mut(next);
                if next_record.due_at.is_none() {
                    next_record.due_at = Some(due);
                    self.record_event(WorkflowEvent::PhaseUnlocked {
                        workflow_id,
                        phase: next,
                        due_at: due,
                    });
                }
            }
        }
        self.updated_at = now;

        let record = self.phase(name);
        Ok(PhaseSnapshot {
            phase: name,
            state: record.effective_state(),
            status: record.schedule_status(sla, now),
            progress,
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Overrides
    // ───────────────────────────────────────────────────────────────

    /// Sets or clears the manual state override for a phase.
    ///
    /// Overrides replace the computed value for display and gating but
    /// never rewrite activity or version records.
    pub fn override_state(
        &mut self,
        name: PhaseName,
        value: Option<PhaseState>,
        reason: impl Into<String>,
        actor: &UserId,
        now: Timestamp,
    ) {
        let workflow_id = self.id;
        let record = self.phase_mut(name);
        record.state_override =
            value.map(|v| PhaseOverride::new(v, reason.into(), actor.clone(), now));
        self.updated_at = now;
        self.record_event(WorkflowEvent::StateOverridden {
            workflow_id,
            phase: name,
            value,
            actor: actor.clone(),
        });
    }

    /// Sets or clears the manual schedule-status override for a phase.
    pub fn override_status(
        &mut self,
        name: PhaseName,
        value: Option<ScheduleStatus>,
        reason: impl Into<String>,
        actor: &UserId,
        now: Timestamp,
    ) {
        let workflow_id = self.id;
        let record = self.phase_mut(name);
        record.status_override =
            value.map(|v| PhaseOverride::new(v, reason.into(), actor.clone(), now));
        self.updated_at = now;
        self.record_event(WorkflowEvent::StatusOverridden {
            workflow_id,
            phase: name,
            value,
            actor: actor.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> UserId {
        UserId::new("tester-1").unwrap()
    }

    fn owner() -> UserId {
        UserId::new("owner-1").unwrap()
    }

    fn sla() -> SlaPolicy {
        SlaPolicy::uniform(7, 2)
    }

    fn workflow() -> ReportWorkflow {
        ReportWorkflow::new(
            CycleId::new(),
            ReportId::new(),
            tester(),
            owner(),
            &sla(),
            Timestamp::now(),
        )
    }

    fn activity_id(wf: &ReportWorkflow, phase: PhaseName, index: usize) -> ActivityId {
        wf.phase(phase).activities()[index].id()
    }

    /// Drives every activity of a phase to Complete.
    fn finish_phase(wf: &mut ReportWorkflow, phase: PhaseName, now: Timestamp) {
        let ids: Vec<ActivityId> = wf.phase(phase).activities().iter().map(|a| a.id()).collect();
        for id in ids {
            wf.start_activity(phase, id, &tester(), now).unwrap();
            wf.complete_activity(phase, id, &tester(), now).unwrap();
        }
        wf.advance_phase(phase, None, &sla(), now).unwrap();
    }

    #[test]
    fn new_workflow_seeds_all_phases_not_started() {
        let wf = workflow();
        assert_eq!(wf.phases().len(), 8);
        for phase in wf.phases() {
            assert_eq!(phase.state(), PhaseState::NotStarted);
        }
    }

    #[test]
    fn new_workflow_unlocks_only_first_phase() {
        let wf = workflow();
        assert!(wf.phase(PhaseName::Planning).due_at().is_some());
        assert!(wf.phase(PhaseName::Scoping).due_at().is_none());
        assert!(wf.phase_unlocked(PhaseName::Planning));
        assert!(!wf.phase_unlocked(PhaseName::Scoping));
    }

    #[test]
    fn starting_first_activity_moves_phase_in_progress() {
        let mut wf = workflow();
        let id = activity_id(&wf, PhaseName::Planning, 0);
        wf.start_activity(PhaseName::Planning, id, &tester(), Timestamp::now())
            .unwrap();
        assert_eq!(wf.phase(PhaseName::Planning).state(), PhaseState::InProgress);
        assert!(wf.phase(PhaseName::Planning).actual_start().is_some());
    }

    #[test]
    fn start_type_activity_auto_completes_in_same_call() {
        let mut wf = workflow();
        let id = activity_id(&wf, PhaseName::Planning, 0);
        wf.start_activity(PhaseName::Planning, id, &tester(), Timestamp::now())
            .unwrap();
        let activity = wf.phase(PhaseName::Planning).activity(id).unwrap();
        assert!(activity.status().is_complete());
    }

    #[test]
    fn starting_activity_in_locked_phase_fails_phase_out_of_order() {
        let mut wf = workflow();
        let id = activity_id(&wf, PhaseName::Scoping, 0);
        let err = wf
            .start_activity(PhaseName::Scoping, id, &tester(), Timestamp::now())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PhaseOutOfOrder);
        // Phase untouched.
        assert_eq!(wf.phase(PhaseName::Scoping).state(), PhaseState::NotStarted);
    }

    #[test]
    fn starting_activity_before_required_predecessor_fails() {
        let mut wf = workflow();
        // Skip the start activity and jump to the third activity.
        let id = activity_id(&wf, PhaseName::Planning, 2);
        let err = wf
            .start_activity(PhaseName::Planning, id, &tester(), Timestamp::now())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ActivityOutOfOrder);
    }

    #[test]
    fn optional_activity_can_be_skipped() {
        let mut wf = workflow();
        let now = Timestamp::now();
        // Planning: [start(auto), task, review(optional), complete]
        let start = activity_id(&wf, PhaseName::Planning, 0);
        let task = activity_id(&wf, PhaseName::Planning, 1);
        let complete = activity_id(&wf, PhaseName::Planning, 3);
        wf.start_activity(PhaseName::Planning, start, &tester(), now).unwrap();
        wf.start_activity(PhaseName::Planning, task, &tester(), now).unwrap();
        wf.complete_activity(PhaseName::Planning, task, &tester(), now).unwrap();
        // Review is optional; completing the final activity is allowed.
        wf.complete_activity(PhaseName::Planning, complete, &tester(), now)
            .unwrap();
        let snapshot = wf.advance_phase(PhaseName::Planning, None, &sla(), now).unwrap();
        assert_eq!(snapshot.state, PhaseState::Complete);
    }

    #[test]
    fn complete_twice_is_noop_success() {
        let mut wf = workflow();
        let now = Timestamp::now();
        let start = activity_id(&wf, PhaseName::Planning, 0);
        let task = activity_id(&wf, PhaseName::Planning, 1);
        wf.start_activity(PhaseName::Planning, start, &tester(), now).unwrap();
        wf.complete_activity(PhaseName::Planning, task, &tester(), now).unwrap();
        let before = wf.phase(PhaseName::Planning).activity(task).unwrap().clone();
        wf.complete_activity(PhaseName::Planning, task, &owner(), now.add_days(1))
            .unwrap();
        let after = wf.phase(PhaseName::Planning).activity(task).unwrap();
        assert_eq!(&before, after);
    }

    #[test]
    fn completing_phase_unlocks_next_and_stamps_due_date() {
        let mut wf = workflow();
        let now = Timestamp::now();
        finish_phase(&mut wf, PhaseName::Planning, now);
        assert_eq!(wf.phase(PhaseName::Planning).state(), PhaseState::Complete);
        assert!(wf.phase_unlocked(PhaseName::Scoping));
        assert_eq!(
            wf.phase(PhaseName::Scoping).due_at(),
            Some(now.add_days(7))
        );
    }

    #[test]
    fn advance_on_locked_phase_fails_and_leaves_phase_untouched() {
        let mut wf = workflow();
        let err = wf
            .advance_phase(PhaseName::Scoping, None, &sla(), Timestamp::now())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PhaseOutOfOrder);
        assert_eq!(wf.phase(PhaseName::Scoping).state(), PhaseState::NotStarted);
        assert!(wf.phase(PhaseName::Scoping).actual_end().is_none());
    }

    #[test]
    fn advance_withholds_complete_until_version_approved() {
        let mut wf = workflow();
        let now = Timestamp::now();
        let ids: Vec<ActivityId> = wf
            .phase(PhaseName::Planning)
            .activities()
            .iter()
            .map(|a| a.id())
            .collect();
        for id in ids {
            wf.start_activity(PhaseName::Planning, id, &tester(), now).unwrap();
            wf.complete_activity(PhaseName::Planning, id, &tester(), now).unwrap();
        }
        let snapshot = wf
            .advance_phase(PhaseName::Planning, Some(false), &sla(), now)
            .unwrap();
        assert_eq!(snapshot.state, PhaseState::InProgress);

        let snapshot = wf
            .advance_phase(PhaseName::Planning, Some(true), &sla(), now)
            .unwrap();
        assert_eq!(snapshot.state, PhaseState::Complete);
    }

    #[test]
    fn state_override_wins_and_unlocks_successor() {
        let mut wf = workflow();
        let now = Timestamp::now();
        wf.override_state(
            PhaseName::Planning,
            Some(PhaseState::Complete),
            "migrated mid-cycle",
            &owner(),
            now,
        );
        assert_eq!(wf.phase(PhaseName::Planning).state(), PhaseState::NotStarted);
        assert_eq!(
            wf.phase(PhaseName::Planning).effective_state(),
            PhaseState::Complete
        );
        // Successor is now workable.
        let id = activity_id(&wf, PhaseName::Scoping, 0);
        assert!(wf.start_activity(PhaseName::Scoping, id, &tester(), now).is_ok());
    }

    #[test]
    fn clearing_override_restores_computed_state() {
        let mut wf = workflow();
        let now = Timestamp::now();
        wf.override_state(
            PhaseName::Planning,
            Some(PhaseState::Complete),
            "backfill",
            &owner(),
            now,
        );
        wf.override_state(PhaseName::Planning, None, "undo backfill", &owner(), now);
        assert_eq!(
            wf.phase(PhaseName::Planning).effective_state(),
            PhaseState::NotStarted
        );
    }

    #[test]
    fn status_override_wins_over_sla_assessment() {
        let mut wf = workflow();
        let now = Timestamp::now();
        wf.override_status(
            PhaseName::Planning,
            Some(ScheduleStatus::AtRisk),
            "vendor delay",
            &owner(),
            now,
        );
        assert_eq!(
            wf.phase(PhaseName::Planning).schedule_status(&sla(), now),
            ScheduleStatus::AtRisk
        );
    }

    #[test]
    fn schedule_status_goes_past_due_after_due_date() {
        let wf = workflow();
        let later = Timestamp::now().add_days(30);
        assert_eq!(
            wf.phase(PhaseName::Planning).schedule_status(&sla(), later),
            ScheduleStatus::PastDue
        );
    }

    #[test]
    fn advance_reports_progress_percent() {
        let mut wf = workflow();
        let now = Timestamp::now();
        let start = activity_id(&wf, PhaseName::Planning, 0);
        wf.start_activity(PhaseName::Planning, start, &tester(), now).unwrap();
        let snapshot = wf.advance_phase(PhaseName::Planning, None, &sla(), now).unwrap();
        // 1 of 3 required activities complete (review is optional).
        assert_eq!(snapshot.progress.percent(), 33);
        assert_eq!(snapshot.state, PhaseState::InProgress);
    }

    #[test]
    fn events_are_recorded_and_drained() {
        let mut wf = workflow();
        let now = Timestamp::now();
        let start = activity_id(&wf, PhaseName::Planning, 0);
        wf.take_events();
        wf.start_activity(PhaseName::Planning, start, &tester(), now).unwrap();
        let events = wf.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, WorkflowEvent::PhaseStarted { phase, .. } if *phase == PhaseName::Planning)));
        assert!(events
            .iter()
            .any(|e| matches!(e, WorkflowEvent::ActivityCompleted { .. })));
        assert!(wf.take_events().is_empty());
    }

    #[test]
    fn full_catalog_walk_reaches_test_report() {
        let mut wf = workflow();
        let now = Timestamp::now();
        for phase in PhaseSequence::all() {
            finish_phase(&mut wf, *phase, now);
        }
        assert_eq!(wf.phase(PhaseName::TestReport).state(), PhaseState::Complete);
    }

    #[test]
    fn reconstitute_rejects_wrong_phase_order() {
        let mut phases: Vec<Phase> = PhaseSequence::all().iter().map(|p| Phase::new(*p)).collect();
        phases.swap(0, 1);
        let result = ReportWorkflow::reconstitute(
            WorkflowId::new(),
            CycleId::new(),
            ReportId::new(),
            tester(),
            owner(),
            phases,
            Timestamp::now(),
            Timestamp::now(),
        );
        assert!(result.is_err());
    }
}
