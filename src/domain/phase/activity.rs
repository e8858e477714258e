//! Activity entities and the fixed per-phase activity templates.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PhaseName;
use crate::domain::foundation::{ActivityId, StateMachine, Timestamp, UserId};

/// The kind of work an activity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Start,
    Task,
    Review,
    Approval,
    Complete,
}

impl ActivityType {
    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Start => "start",
            ActivityType::Task => "task",
            ActivityType::Review => "review",
            ActivityType::Approval => "approval",
            ActivityType::Complete => "complete",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress tracking for a single activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl ActivityStatus {
    /// Returns true if work has begun on this activity.
    pub fn is_started(&self) -> bool {
        !matches!(self, ActivityStatus::NotStarted)
    }

    /// Returns true if the activity is finished.
    pub fn is_complete(&self) -> bool {
        matches!(self, ActivityStatus::Complete)
    }

    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::NotStarted => "not_started",
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Complete => "complete",
        }
    }
}

impl StateMachine for ActivityStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ActivityStatus::*;
        matches!(
            (self, target),
            (NotStarted, InProgress) | (InProgress, Complete)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ActivityStatus::*;
        match self {
            NotStarted => vec![InProgress],
            InProgress => vec![Complete],
            Complete => vec![],
        }
    }
}

/// Template row for seeding a phase's activity list.
#[derive(Debug, Clone, Copy)]
pub struct ActivityTemplate {
    pub name: &'static str,
    pub activity_type: ActivityType,
    pub is_manual: bool,
    pub is_optional: bool,
}

impl ActivityTemplate {
    const fn new(
        name: &'static str,
        activity_type: ActivityType,
        is_manual: bool,
        is_optional: bool,
    ) -> Self {
        Self {
            name,
            activity_type,
            is_manual,
            is_optional,
        }
    }

    /// The fixed activity list for a phase, in execution order.
    ///
    /// Start activities are automatic (they only initialize records and
    /// complete in the same call); everything else is manual unless noted.
    pub fn for_phase(phase: PhaseName) -> &'static [ActivityTemplate] {
        use ActivityType::*;
        const PLANNING: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start Planning Phase", Start, false, false),
            ActivityTemplate::new("Load Report Attributes", Task, true, false),
            ActivityTemplate::new("Review Planning Checklist", Review, true, true),
            ActivityTemplate::new("Complete Planning Phase", Complete, true, false),
        ];
        const SCOPING: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start Scoping Phase", Start, false, false),
            ActivityTemplate::new("Generate Scoping Recommendations", Task, true, false),
            ActivityTemplate::new("Make Tester Decisions", Task, true, false),
            ActivityTemplate::new("Report Owner Approval", Approval, true, false),
            ActivityTemplate::new("Complete Scoping Phase", Complete, true, false),
        ];
        const SAMPLE_SELECTION: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start Sample Selection Phase", Start, false, false),
            ActivityTemplate::new("Define Selection Criteria", Task, true, false),
            ActivityTemplate::new("Select Samples", Task, true, false),
            ActivityTemplate::new("Report Owner Approval", Approval, true, false),
            ActivityTemplate::new("Complete Sample Selection Phase", Complete, true, false),
        ];
        const DATA_OWNER_ID: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start Data Owner ID Phase", Start, false, false),
            ActivityTemplate::new("Map Attributes to LOBs", Task, true, false),
            ActivityTemplate::new("Assign Data Owners", Task, true, false),
            ActivityTemplate::new("Complete Data Owner ID Phase", Complete, true, false),
        ];
        const RFI: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start RFI Phase", Start, false, false),
            ActivityTemplate::new("Issue Information Requests", Task, true, false),
            ActivityTemplate::new("Collect Source Evidence", Task, true, false),
            ActivityTemplate::new("Complete RFI Phase", Complete, true, false),
        ];
        const TEST_EXECUTION: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start Test Execution Phase", Start, false, false),
            ActivityTemplate::new("Execute Test Cases", Task, true, false),
            ActivityTemplate::new("Record Test Results", Task, true, false),
            ActivityTemplate::new("Review Test Results", Review, true, true),
            ActivityTemplate::new("Complete Test Execution Phase", Complete, true, false),
        ];
        const OBSERVATION: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start Observation Phase", Start, false, false),
            ActivityTemplate::new("Raise Observations", Task, true, true),
            ActivityTemplate::new("Rate and Group Observations", Task, true, true),
            ActivityTemplate::new("Report Owner Approval", Approval, true, false),
            ActivityTemplate::new("Complete Observation Phase", Complete, true, false),
        ];
        const TEST_REPORT: &[ActivityTemplate] = &[
            ActivityTemplate::new("Start Test Report Phase", Start, false, false),
            ActivityTemplate::new("Draft Report Sections", Task, true, false),
            ActivityTemplate::new("Executive Review", Review, true, false),
            ActivityTemplate::new("Final Approval", Approval, true, false),
            ActivityTemplate::new("Complete Test Report Phase", Complete, true, false),
        ];
        match phase {
            PhaseName::Planning => PLANNING,
            PhaseName::Scoping => SCOPING,
            PhaseName::SampleSelection => SAMPLE_SELECTION,
            PhaseName::DataOwnerIdentification => DATA_OWNER_ID,
            PhaseName::RequestForInformation => RFI,
            PhaseName::TestExecution => TEST_EXECUTION,
            PhaseName::ObservationManagement => OBSERVATION,
            PhaseName::TestReport => TEST_REPORT,
        }
    }
}

/// One unit of gated work within a phase.
///
/// `order` is unique within the owning phase. Start/completion audit fields
/// are stamped by the aggregate; `can_start`/`can_complete` are derived
/// queries on the aggregate, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    id: ActivityId,
    name: String,
    order: u8,
    activity_type: ActivityType,
    is_manual: bool,
    is_optional: bool,
    status: ActivityStatus,
    started_by: Option<UserId>,
    started_at: Option<Timestamp>,
    completed_by: Option<UserId>,
    completed_at: Option<Timestamp>,
}

impl Activity {
    /// Creates a fresh activity from a template row.
    pub fn from_template(template: &ActivityTemplate, order: u8) -> Self {
        Self {
            id: ActivityId::new(),
            name: template.name.to_string(),
            order,
            activity_type: template.activity_type,
            is_manual: template.is_manual,
            is_optional: template.is_optional,
            status: ActivityStatus::NotStarted,
            started_by: None,
            started_at: None,
            completed_by: None,
            completed_at: None,
        }
    }

    /// Reconstitutes an activity from persisted data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ActivityId,
        name: String,
        order: u8,
        activity_type: ActivityType,
        is_manual: bool,
        is_optional: bool,
        status: ActivityStatus,
        started_by: Option<UserId>,
        started_at: Option<Timestamp>,
        completed_by: Option<UserId>,
        completed_at: Option<Timestamp>,
    ) -> Self {
        Self {
            id,
            name,
            order,
            activity_type,
            is_manual,
            is_optional,
            status,
            started_by,
            started_at,
            completed_by,
            completed_at,
        }
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub fn is_manual(&self) -> bool {
        self.is_manual
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn status(&self) -> ActivityStatus {
        self.status
    }

    pub fn started_by(&self) -> Option<&UserId> {
        self.started_by.as_ref()
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn completed_by(&self) -> Option<&UserId> {
        self.completed_by.as_ref()
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// Marks the activity started, stamping the audit fields.
    ///
    /// Idempotent: starting an already-started activity is a no-op.
    pub(crate) fn mark_started(&mut self, actor: &UserId, at: Timestamp) {
        if self.status.is_started() {
            return;
        }
        self.status = ActivityStatus::InProgress;
        self.started_by = Some(actor.clone());
        self.started_at = Some(at);
    }

    /// Marks the activity complete, stamping the audit fields.
    ///
    /// Idempotent: completing an already-complete activity is a no-op.
    pub(crate) fn mark_completed(&mut self, actor: &UserId, at: Timestamp) {
        if self.status.is_complete() {
            return;
        }
        if !self.status.is_started() {
            // Completing straight from NotStarted implies starting too.
            self.started_by = Some(actor.clone());
            self.started_at = Some(at);
        }
        self.status = ActivityStatus::Complete;
        self.completed_by = Some(actor.clone());
        self.completed_at = Some(at);
    }
}
