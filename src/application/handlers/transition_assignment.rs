//! TransitionAssignmentHandler - caller-driven assignment lifecycle.
//!
//! Acknowledge and Complete are driven by the target user acting on the
//! task; Cancel is an explicit administrative action. Nothing in the
//! engine cancels assignments implicitly - superseding or rejecting a
//! version leaves its in-flight assignments alone so the audit trail
//! survives.

use std::sync::Arc;

use crate::domain::assignment::Assignment;
use crate::domain::foundation::{
    AssignmentId, CommandMetadata, DomainError, ErrorCode, Timestamp,
};
use crate::ports::AssignmentRepository;

/// The lifecycle action to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentAction {
    /// Target user viewed the task.
    Acknowledge,
    /// Target user acted on the task.
    Complete,
    /// Explicit cancellation (audit-preserving).
    Cancel,
}

/// Command to transition an assignment.
#[derive(Debug, Clone)]
pub struct TransitionAssignmentCommand {
    pub assignment_id: AssignmentId,
    pub action: AssignmentAction,
}

/// Handler for assignment transitions.
pub struct TransitionAssignmentHandler {
    assignment_repository: Arc<dyn AssignmentRepository>,
}

impl TransitionAssignmentHandler {
    pub fn new(assignment_repository: Arc<dyn AssignmentRepository>) -> Self {
        Self { assignment_repository }
    }

    pub async fn handle(
        &self,
        cmd: TransitionAssignmentCommand,
        metadata: CommandMetadata,
    ) -> Result<Assignment, DomainError> {
        let mut assignment = self
            .assignment_repository
            .find_by_id(&cmd.assignment_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AssignmentNotFound,
                    format!("Assignment not found: {}", cmd.assignment_id),
                )
            })?;

        let now = Timestamp::now();
        match cmd.action {
            AssignmentAction::Acknowledge => assignment.acknowledge(now)?,
            AssignmentAction::Complete => assignment.complete(now)?,
            AssignmentAction::Cancel => assignment.cancel(now)?,
        }
        self.assignment_repository.update(&assignment).await?;

        tracing::info!(
            assignment_id = %cmd.assignment_id,
            status = %assignment.status(),
            actor = %metadata.user_id,
            "assignment transitioned"
        );
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryAssignmentRepository;
    use crate::domain::assignment::{
        AssignmentContext, AssignmentStatus, AssignmentType, Priority,
    };
    use crate::domain::foundation::{CycleId, LobId, ReportId, Role, UserId, VersionId};
    use crate::domain::phase::PhaseName;

    fn metadata() -> CommandMetadata {
        CommandMetadata::new(UserId::new("downer-7").unwrap())
    }

    async fn stored_assignment(repo: &Arc<InMemoryAssignmentRepository>) -> Assignment {
        let assignment = Assignment::new(
            AssignmentType::LobAssignment,
            Role::Tester,
            Role::DataOwner,
            UserId::new("tester-1").unwrap(),
            UserId::new("downer-7").unwrap(),
            AssignmentContext {
                cycle_id: CycleId::new(),
                report_id: ReportId::new(),
                phase: PhaseName::DataOwnerIdentification,
                version_id: VersionId::new(),
                subject_id: "attr-401".into(),
                lob_id: LobId::new(338).unwrap(),
            },
            Priority::Medium,
            Timestamp::now(),
        );
        repo.insert_if_absent(assignment.clone()).await.unwrap();
        assignment
    }

    #[tokio::test]
    async fn acknowledge_then_complete_walks_the_lifecycle() {
        let repo = Arc::new(InMemoryAssignmentRepository::new());
        let assignment = stored_assignment(&repo).await;
        let handler = TransitionAssignmentHandler::new(repo.clone());

        let acked = handler
            .handle(
                TransitionAssignmentCommand {
                    assignment_id: assignment.id(),
                    action: AssignmentAction::Acknowledge,
                },
                metadata(),
            )
            .await
            .unwrap();
        assert_eq!(acked.status(), AssignmentStatus::Acknowledged);

        let completed = handler
            .handle(
                TransitionAssignmentCommand {
                    assignment_id: assignment.id(),
                    action: AssignmentAction::Complete,
                },
                metadata(),
            )
            .await
            .unwrap();
        assert_eq!(completed.status(), AssignmentStatus::Completed);
        assert!(completed.completed_at().is_some());
    }

    #[tokio::test]
    async fn cancel_preserves_the_row() {
        let repo = Arc::new(InMemoryAssignmentRepository::new());
        let assignment = stored_assignment(&repo).await;
        let handler = TransitionAssignmentHandler::new(repo.clone());

        handler
            .handle(
                TransitionAssignmentCommand {
                    assignment_id: assignment.id(),
                    action: AssignmentAction::Cancel,
                },
                metadata(),
            )
            .await
            .unwrap();

        let stored = repo.find_by_id(&assignment.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), AssignmentStatus::Cancelled);
        assert_eq!(repo.row_count(), 1);
    }

    #[tokio::test]
    async fn completing_a_cancelled_assignment_fails() {
        let repo = Arc::new(InMemoryAssignmentRepository::new());
        let assignment = stored_assignment(&repo).await;
        let handler = TransitionAssignmentHandler::new(repo);

        handler
            .handle(
                TransitionAssignmentCommand {
                    assignment_id: assignment.id(),
                    action: AssignmentAction::Cancel,
                },
                metadata(),
            )
            .await
            .unwrap();
        let err = handler
            .handle(
                TransitionAssignmentCommand {
                    assignment_id: assignment.id(),
                    action: AssignmentAction::Complete,
                },
                metadata(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn unknown_assignment_fails() {
        let repo = Arc::new(InMemoryAssignmentRepository::new());
        let handler = TransitionAssignmentHandler::new(repo);
        let err = handler
            .handle(
                TransitionAssignmentCommand {
                    assignment_id: AssignmentId::new(),
                    action: AssignmentAction::Acknowledge,
                },
                metadata(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AssignmentNotFound);
    }
}
