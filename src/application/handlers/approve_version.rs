//! ApproveVersionHandler - approves a submitted version.
//!
//! Approval is atomic within the chain aggregate: the target version
//! becomes Approved and any previously approved version Superseded in the
//! same repository update. The handler returns the decision items now
//! requiring downstream action so the caller can reconcile assignments.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, Timestamp, VersionId};
use crate::domain::version::DecisionItem;
use crate::ports::VersionRepository;

/// Command to approve a version.
#[derive(Debug, Clone)]
pub struct ApproveVersionCommand {
    pub version_id: VersionId,
    pub notes: Option<String>,
}

/// Result of approving a version.
#[derive(Debug)]
pub struct ApproveVersionResult {
    /// Items with an approved report-owner decision that fan out work.
    pub actionable_items: Vec<DecisionItem>,
}

/// Handler for approving versions.
pub struct ApproveVersionHandler {
    version_repository: Arc<dyn VersionRepository>,
}

impl ApproveVersionHandler {
    pub fn new(version_repository: Arc<dyn VersionRepository>) -> Self {
        Self { version_repository }
    }

    pub async fn handle(
        &self,
        cmd: ApproveVersionCommand,
        metadata: CommandMetadata,
    ) -> Result<ApproveVersionResult, DomainError> {
        let mut chain = self
            .version_repository
            .find_by_version(&cmd.version_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::VersionNotFound,
                    format!("Version not found: {}", cmd.version_id),
                )
            })?;

        let actionable_items =
            chain.approve(cmd.version_id, &metadata.user_id, cmd.notes, Timestamp::now())?;
        self.version_repository.update(&chain).await?;

        tracing::info!(
            version_id = %cmd.version_id,
            phase = %chain.phase(),
            actor = %metadata.user_id,
            actionable = actionable_items.len(),
            "version approved"
        );

        Ok(ApproveVersionResult { actionable_items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVersionRepository;
    use crate::domain::foundation::{LobId, Role, UserId, WorkflowId};
    use crate::domain::phase::PhaseName;
    use crate::domain::version::{Decision, VersionChain, VersionStatus};

    fn owner() -> CommandMetadata {
        CommandMetadata::new(UserId::new("owner-1").unwrap())
    }

    /// A submitted version holding one assignable and one quiet item.
    async fn submitted_version(repo: &Arc<InMemoryVersionRepository>) -> VersionId {
        let tester = UserId::new("tester-1").unwrap();
        let now = Timestamp::now();
        let mut chain = VersionChain::new(WorkflowId::new(), PhaseName::Scoping);
        let v1 = chain.create_draft(None, &tester, now).unwrap();
        let flagged = chain
            .add_item(v1, DecisionItem::new("attr-401", LobId::new(338).unwrap(), true).unwrap())
            .unwrap();
        chain
            .add_item(v1, DecisionItem::new("attr-402", LobId::new(338).unwrap(), false).unwrap())
            .unwrap();
        chain
            .set_decision(v1, flagged, Role::ReportOwner, Decision::Approved, None)
            .unwrap();
        chain.submit(v1, &tester, None, now).unwrap();
        repo.save(&chain).await.unwrap();
        v1
    }

    #[tokio::test]
    async fn approves_and_returns_actionable_items() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let v1 = submitted_version(&repo).await;
        let handler = ApproveVersionHandler::new(repo.clone());

        let result = handler
            .handle(
                ApproveVersionCommand {
                    version_id: v1,
                    notes: None,
                },
                owner(),
            )
            .await
            .unwrap();

        assert_eq!(result.actionable_items.len(), 1);
        assert_eq!(result.actionable_items[0].subject_id(), "attr-401");

        let chain = repo.find_by_version(&v1).await.unwrap().unwrap();
        assert_eq!(chain.current_approved().unwrap().id(), v1);
    }

    #[tokio::test]
    async fn approving_a_draft_fails() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let mut chain = VersionChain::new(WorkflowId::new(), PhaseName::Scoping);
        let v1 = chain
            .create_draft(None, &UserId::new("tester-1").unwrap(), Timestamp::now())
            .unwrap();
        repo.save(&chain).await.unwrap();
        let handler = ApproveVersionHandler::new(repo);

        let err = handler
            .handle(
                ApproveVersionCommand {
                    version_id: v1,
                    notes: None,
                },
                owner(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotInPendingApproval);
    }

    #[tokio::test]
    async fn second_approval_attempt_fails() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let v1 = submitted_version(&repo).await;
        let handler = ApproveVersionHandler::new(repo);

        let cmd = ApproveVersionCommand {
            version_id: v1,
            notes: None,
        };
        handler.handle(cmd.clone(), owner()).await.unwrap();
        let err = handler.handle(cmd, owner()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotInPendingApproval);
    }

    #[tokio::test]
    async fn approving_successor_supersedes_predecessor() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let v1 = submitted_version(&repo).await;
        let handler = ApproveVersionHandler::new(repo.clone());
        handler
            .handle(
                ApproveVersionCommand {
                    version_id: v1,
                    notes: None,
                },
                owner(),
            )
            .await
            .unwrap();

        // Branch, submit, approve a successor.
        let tester = UserId::new("tester-1").unwrap();
        let now = Timestamp::now();
        let mut chain = repo.find_by_version(&v1).await.unwrap().unwrap();
        let v2 = chain.create_draft(Some(v1), &tester, now).unwrap();
        chain.submit(v2, &tester, None, now).unwrap();
        repo.update(&chain).await.unwrap();

        handler
            .handle(
                ApproveVersionCommand {
                    version_id: v2,
                    notes: None,
                },
                owner(),
            )
            .await
            .unwrap();

        let chain = repo.find_by_version(&v1).await.unwrap().unwrap();
        assert_eq!(chain.version(v1).unwrap().status(), VersionStatus::Superseded);
        assert_eq!(chain.current_approved().unwrap().id(), v2);
    }
}
