//! CompleteActivityHandler - completes one activity of a phase.
//!
//! Completion is idempotent: retried calls from the orchestration layer
//! see a no-op success, never an error.

use std::sync::Arc;

use crate::domain::foundation::{
    ActivityId, CommandMetadata, DomainError, ErrorCode, Timestamp, WorkflowId,
};
use crate::domain::phase::{PhaseName, ReportWorkflow, WorkflowEvent};
use crate::ports::WorkflowRepository;

/// Command to complete an activity.
#[derive(Debug, Clone)]
pub struct CompleteActivityCommand {
    pub workflow_id: WorkflowId,
    pub phase: PhaseName,
    pub activity_id: ActivityId,
}

/// Handler for completing activities.
pub struct CompleteActivityHandler {
    workflow_repository: Arc<dyn WorkflowRepository>,
}

impl CompleteActivityHandler {
    pub fn new(workflow_repository: Arc<dyn WorkflowRepository>) -> Self {
        Self { workflow_repository }
    }

    pub async fn handle(
        &self,
        cmd: CompleteActivityCommand,
        metadata: CommandMetadata,
    ) -> Result<Vec<WorkflowEvent>, DomainError> {
        let mut workflow = self.load(&cmd.workflow_id).await?;

        workflow.complete_activity(
            cmd.phase,
            cmd.activity_id,
            &metadata.user_id,
            Timestamp::now(),
        )?;
        self.workflow_repository.update(&workflow).await?;

        tracing::info!(
            workflow_id = %cmd.workflow_id,
            phase = %cmd.phase,
            activity_id = %cmd.activity_id,
            actor = %metadata.user_id,
            "activity completed"
        );

        Ok(workflow.take_events())
    }

    async fn load(&self, id: &WorkflowId) -> Result<ReportWorkflow, DomainError> {
        self.workflow_repository.find_by_id(id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::WorkflowNotFound, format!("Workflow not found: {}", id))
        })
    }
}
