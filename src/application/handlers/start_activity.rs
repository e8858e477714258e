//! StartActivityHandler - starts one activity of a phase.
//!
//! The workflow aggregate enforces the activity gate: the phase must be
//! unlocked and the preceding required activity complete. Start-type
//! automatic activities complete inside the same aggregate mutation, so
//! the single repository update persists both or neither.

use std::sync::Arc;

use crate::domain::foundation::{
    ActivityId, CommandMetadata, DomainError, ErrorCode, Timestamp, WorkflowId,
};
use crate::domain::phase::{ActivityStatus, PhaseName, ReportWorkflow, WorkflowEvent};
use crate::ports::WorkflowRepository;

/// Command to start an activity.
#[derive(Debug, Clone)]
pub struct StartActivityCommand {
    pub workflow_id: WorkflowId,
    pub phase: PhaseName,
    pub activity_id: ActivityId,
}

/// Result of starting an activity.
#[derive(Debug)]
pub struct StartActivityResult {
    /// Status of the activity after the call (Complete for auto-completing
    /// start activities).
    pub activity_status: ActivityStatus,
    /// Events recorded by the mutation.
    pub events: Vec<WorkflowEvent>,
}

/// Handler for starting activities.
pub struct StartActivityHandler {
    workflow_repository: Arc<dyn WorkflowRepository>,
}

impl StartActivityHandler {
    pub fn new(workflow_repository: Arc<dyn WorkflowRepository>) -> Self {
        Self { workflow_repository }
    }

    pub async fn handle(
        &self,
        cmd: StartActivityCommand,
        metadata: CommandMetadata,
    ) -> Result<StartActivityResult, DomainError> {
        let mut workflow = self.load(&cmd.workflow_id).await?;

        workflow.start_activity(cmd.phase, cmd.activity_id, &metadata.user_id, Timestamp::now())?;
        self.workflow_repository.update(&workflow).await?;

        let events = workflow.take_events();
        let activity_status = workflow
            .phase(cmd.phase)
            .activity(cmd.activity_id)
            .map(|a| a.status())
            .unwrap_or_default();

        tracing::info!(
            workflow_id = %cmd.workflow_id,
            phase = %cmd.phase,
            activity_id = %cmd.activity_id,
            actor = %metadata.user_id,
            "activity started"
        );

        Ok(StartActivityResult {
            activity_status,
            events,
        })
    }

    async fn load(&self, id: &WorkflowId) -> Result<ReportWorkflow, DomainError> {
        self.workflow_repository.find_by_id(id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::WorkflowNotFound, format!("Workflow not found: {}", id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryWorkflowRepository;
    use crate::domain::foundation::{CycleId, ReportId, UserId};
    use crate::domain::phase::SlaPolicy;

    fn metadata() -> CommandMetadata {
        CommandMetadata::new(UserId::new("tester-1").unwrap())
    }

    async fn setup() -> (Arc<InMemoryWorkflowRepository>, ReportWorkflow) {
        let repo = Arc::new(InMemoryWorkflowRepository::new());
        let workflow = ReportWorkflow::new(
            CycleId::new(),
            ReportId::new(),
            UserId::new("tester-1").unwrap(),
            UserId::new("owner-1").unwrap(),
            &SlaPolicy::uniform(7, 2),
            Timestamp::now(),
        );
        repo.save(&workflow).await.unwrap();
        (repo, workflow)
    }

    fn first_activity(workflow: &ReportWorkflow, phase: PhaseName) -> ActivityId {
        workflow.phase(phase).activities()[0].id()
    }

    #[tokio::test]
    async fn starts_and_auto_completes_start_activity() {
        let (repo, workflow) = setup().await;
        let handler = StartActivityHandler::new(repo.clone());

        let cmd = StartActivityCommand {
            workflow_id: workflow.id(),
            phase: PhaseName::Planning,
            activity_id: first_activity(&workflow, PhaseName::Planning),
        };
        let result = handler.handle(cmd, metadata()).await.unwrap();

        assert_eq!(result.activity_status, ActivityStatus::Complete);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e, WorkflowEvent::PhaseStarted { .. })));

        let stored = repo.find_by_id(&workflow.id()).await.unwrap().unwrap();
        assert!(stored.phase(PhaseName::Planning).state().is_started());
    }

    #[tokio::test]
    async fn fails_when_workflow_not_found() {
        let (repo, workflow) = setup().await;
        let handler = StartActivityHandler::new(repo);

        let cmd = StartActivityCommand {
            workflow_id: WorkflowId::new(),
            phase: PhaseName::Planning,
            activity_id: first_activity(&workflow, PhaseName::Planning),
        };
        let err = handler.handle(cmd, metadata()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::WorkflowNotFound);
    }

    #[tokio::test]
    async fn fails_phase_out_of_order_for_locked_phase() {
        let (repo, workflow) = setup().await;
        let handler = StartActivityHandler::new(repo.clone());

        let cmd = StartActivityCommand {
            workflow_id: workflow.id(),
            phase: PhaseName::Scoping,
            activity_id: first_activity(&workflow, PhaseName::Scoping),
        };
        let err = handler.handle(cmd, metadata()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PhaseOutOfOrder);

        // Nothing was persisted.
        let stored = repo.find_by_id(&workflow.id()).await.unwrap().unwrap();
        assert!(!stored.phase(PhaseName::Scoping).state().is_started());
    }

    #[tokio::test]
    async fn starting_twice_is_a_noop_success() {
        let (repo, workflow) = setup().await;
        let handler = StartActivityHandler::new(repo);

        let cmd = StartActivityCommand {
            workflow_id: workflow.id(),
            phase: PhaseName::Planning,
            activity_id: first_activity(&workflow, PhaseName::Planning),
        };
        handler.handle(cmd.clone(), metadata()).await.unwrap();
        let second = handler.handle(cmd, metadata()).await.unwrap();
        assert_eq!(second.activity_status, ActivityStatus::Complete);
        assert!(second.events.is_empty());
    }
}
