//! AdvancePhaseHandler - recomputes a phase's state, schedule status, and
//! progress.
//!
//! The terminal-version check reads through the version repository: a
//! phase with versions only completes once its latest version is Approved.
//! Completing a phase unlocks the next one in the catalog. The
//! recomputation is idempotent, so a periodic sweep can call it freely.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, Timestamp, WorkflowId};
use crate::domain::phase::{PhaseName, PhaseSnapshot, ReportWorkflow, SlaPolicy};
use crate::ports::{VersionRepository, WorkflowRepository};

/// Command to advance (recompute) a phase.
#[derive(Debug, Clone)]
pub struct AdvancePhaseCommand {
    pub workflow_id: WorkflowId,
    pub phase: PhaseName,
}

/// Handler for advancing phases.
pub struct AdvancePhaseHandler {
    workflow_repository: Arc<dyn WorkflowRepository>,
    version_repository: Arc<dyn VersionRepository>,
    sla: SlaPolicy,
}

impl AdvancePhaseHandler {
    pub fn new(
        workflow_repository: Arc<dyn WorkflowRepository>,
        version_repository: Arc<dyn VersionRepository>,
        sla: SlaPolicy,
    ) -> Self {
        Self {
            workflow_repository,
            version_repository,
            sla,
        }
    }

    pub async fn handle(
        &self,
        cmd: AdvancePhaseCommand,
        metadata: CommandMetadata,
    ) -> Result<PhaseSnapshot, DomainError> {
        let mut workflow = self.load(&cmd.workflow_id).await?;

        // None when the phase has no versions; otherwise whether the
        // latest version carries the approval.
        let terminal_version_approved = self
            .version_repository
            .find_by_phase(&cmd.workflow_id, cmd.phase)
            .await?
            .and_then(|chain| chain.latest().map(|v| v.status().is_approved()));

        let snapshot = workflow.advance_phase(
            cmd.phase,
            terminal_version_approved,
            &self.sla,
            Timestamp::now(),
        )?;
        self.workflow_repository.update(&workflow).await?;

        tracing::info!(
            workflow_id = %cmd.workflow_id,
            phase = %cmd.phase,
            state = %snapshot.state,
            status = %snapshot.status,
            percent = snapshot.progress.percent(),
            actor = %metadata.user_id,
            "phase advanced"
        );

        Ok(snapshot)
    }

    async fn load(&self, id: &WorkflowId) -> Result<ReportWorkflow, DomainError> {
        self.workflow_repository.find_by_id(id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::WorkflowNotFound, format!("Workflow not found: {}", id))
        })
    }
}
