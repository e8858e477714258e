//! OverridePhaseHandler - manual admin correction of phase state/status.
//!
//! Overrides are a display/reporting escape hatch: they replace the
//! computed value verbatim but never touch activity or version records.
//! Every override carries a reason and the acting admin.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, Timestamp, WorkflowId};
use crate::domain::phase::{PhaseName, PhaseState, ReportWorkflow, ScheduleStatus};
use crate::ports::WorkflowRepository;

/// What to do with one override slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideAction<T> {
    /// Leave the slot as it is.
    Keep,
    /// Set the override to this value.
    Set(T),
    /// Clear the override, restoring the computed value.
    Clear,
}

/// Command to set or clear phase overrides.
#[derive(Debug, Clone)]
pub struct OverridePhaseCommand {
    pub workflow_id: WorkflowId,
    pub phase: PhaseName,
    pub state: OverrideAction<PhaseState>,
    pub status: OverrideAction<ScheduleStatus>,
    pub reason: String,
}

/// Handler for phase overrides.
pub struct OverridePhaseHandler {
    workflow_repository: Arc<dyn WorkflowRepository>,
}

impl OverridePhaseHandler {
    pub fn new(workflow_repository: Arc<dyn WorkflowRepository>) -> Self {
        Self { workflow_repository }
    }

    pub async fn handle(
        &self,
        cmd: OverridePhaseCommand,
        metadata: CommandMetadata,
    ) -> Result<(), DomainError> {
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("reason", "Override reason is required"));
        }
        let mut workflow = self.load(&cmd.workflow_id).await?;
        let now = Timestamp::now();

        match cmd.state {
            OverrideAction::Keep => {}
            OverrideAction::Set(value) => workflow.override_state(
                cmd.phase,
                Some(value),
                cmd.reason.clone(),
                &metadata.user_id,
                now,
            ),
            OverrideAction::Clear => workflow.override_state(
                cmd.phase,
                None,
                cmd.reason.clone(),
                &metadata.user_id,
                now,
            ),
        }
        match cmd.status {
            OverrideAction::Keep => {}
            OverrideAction::Set(value) => workflow.override_status(
                cmd.phase,
                Some(value),
                cmd.reason.clone(),
                &metadata.user_id,
                now,
            ),
            OverrideAction::Clear => workflow.override_status(
                cmd.phase,
                None,
                cmd.reason.clone(),
                &metadata.user_id,
                now,
            ),
        }

        self.workflow_repository.update(&workflow).await?;

        tracing::warn!(
            workflow_id = %cmd.workflow_id,
            phase = %cmd.phase,
            actor = %metadata.user_id,
            reason = %cmd.reason,
            "phase override applied"
        );
        Ok(())
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
        CommandMetadata::new(UserId::new("admin-1").unwrap())
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

    #[tokio::test]
    async fn sets_state_override_with_audit_trail() {
        let (repo, workflow) = setup().await;
        let handler = OverridePhaseHandler::new(repo.clone());

        handler
            .handle(
                OverridePhaseCommand {
                    workflow_id: workflow.id(),
                    phase: PhaseName::Planning,
                    state: OverrideAction::Set(PhaseState::Complete),
                    status: OverrideAction::Keep,
                    reason: "backfilled from legacy tracker".into(),
                },
                metadata(),
            )
            .await
            .unwrap();

        let stored = repo.find_by_id(&workflow.id()).await.unwrap().unwrap();
        let phase = stored.phase(PhaseName::Planning);
        assert_eq!(phase.effective_state(), PhaseState::Complete);
        assert_eq!(phase.state(), PhaseState::NotStarted);
        let ov = phase.state_override().unwrap();
        assert_eq!(ov.reason, "backfilled from legacy tracker");
        assert_eq!(ov.actor.as_str(), "admin-1");
    }

    #[tokio::test]
    async fn rejects_empty_reason() {
        let (repo, workflow) = setup().await;
        let handler = OverridePhaseHandler::new(repo);
        let err = handler
            .handle(
                OverridePhaseCommand {
                    workflow_id: workflow.id(),
                    phase: PhaseName::Planning,
                    state: OverrideAction::Set(PhaseState::Complete),
                    status: OverrideAction::Keep,
                    reason: "  ".into(),
                },
                metadata(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn clears_status_override() {
        let (repo, workflow) = setup().await;
        let handler = OverridePhaseHandler::new(repo.clone());

        handler
            .handle(
                OverridePhaseCommand {
                    workflow_id: workflow.id(),
                    phase: PhaseName::Planning,
                    state: OverrideAction::Keep,
                    status: OverrideAction::Set(ScheduleStatus::AtRisk),
                    reason: "vendor delay".into(),
                },
                metadata(),
            )
            .await
            .unwrap();
        handler
            .handle(
                OverridePhaseCommand {
                    workflow_id: workflow.id(),
                    phase: PhaseName::Planning,
                    state: OverrideAction::Keep,
                    status: OverrideAction::Clear,
                    reason: "delay resolved".into(),
                },
                metadata(),
            )
            .await
            .unwrap();

        let stored = repo.find_by_id(&workflow.id()).await.unwrap().unwrap();
        assert!(stored.phase(PhaseName::Planning).status_override().is_none());
    }
}
