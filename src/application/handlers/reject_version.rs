//! RejectVersionHandler - rejects a submitted version with a reason.
//!
//! Rejection does not cut a follow-up draft and does not touch in-flight
//! assignments; both are explicit caller decisions.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, Timestamp, VersionId};
use crate::ports::VersionRepository;

/// Command to reject a version.
#[derive(Debug, Clone)]
pub struct RejectVersionCommand {
    pub version_id: VersionId,
    pub reason: String,
}

/// Handler for rejecting versions.
pub struct RejectVersionHandler {
    version_repository: Arc<dyn VersionRepository>,
}

impl RejectVersionHandler {
    pub fn new(version_repository: Arc<dyn VersionRepository>) -> Self {
        Self { version_repository }
    }

    pub async fn handle(
        &self,
        cmd: RejectVersionCommand,
        metadata: CommandMetadata,
    ) -> Result<(), DomainError> {
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("reason", "Rejection reason is required"));
        }
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

        chain.reject(cmd.version_id, &metadata.user_id, cmd.reason.clone(), Timestamp::now())?;
        self.version_repository.update(&chain).await?;

        tracing::info!(
            version_id = %cmd.version_id,
            phase = %chain.phase(),
            actor = %metadata.user_id,
            "version rejected"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVersionRepository;
    use crate::domain::foundation::{UserId, WorkflowId};
    use crate::domain::phase::PhaseName;
    use crate::domain::version::{VersionChain, VersionStatus};

    fn owner() -> CommandMetadata {
        CommandMetadata::new(UserId::new("owner-1").unwrap())
    }

    async fn submitted_version(repo: &Arc<InMemoryVersionRepository>) -> VersionId {
        let tester = UserId::new("tester-1").unwrap();
        let now = Timestamp::now();
        let mut chain = VersionChain::new(WorkflowId::new(), PhaseName::Scoping);
        let v1 = chain.create_draft(None, &tester, now).unwrap();
        chain.submit(v1, &tester, None, now).unwrap();
        repo.save(&chain).await.unwrap();
        v1
    }

    #[tokio::test]
    async fn rejects_with_reason_and_no_new_draft() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let v1 = submitted_version(&repo).await;
        let handler = RejectVersionHandler::new(repo.clone());

        handler
            .handle(
                RejectVersionCommand {
                    version_id: v1,
                    reason: "sample coverage too thin".into(),
                },
                owner(),
            )
            .await
            .unwrap();

        let chain = repo.find_by_version(&v1).await.unwrap().unwrap();
        assert_eq!(chain.version(v1).unwrap().status(), VersionStatus::Rejected);
        assert_eq!(
            chain.version(v1).unwrap().rejection_reason(),
            Some("sample coverage too thin")
        );
        assert_eq!(chain.versions().len(), 1);
    }

    #[tokio::test]
    async fn rejecting_a_draft_fails() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let mut chain = VersionChain::new(WorkflowId::new(), PhaseName::Scoping);
        let v1 = chain
            .create_draft(None, &UserId::new("tester-1").unwrap(), Timestamp::now())
            .unwrap();
        repo.save(&chain).await.unwrap();
        let handler = RejectVersionHandler::new(repo);

        let err = handler
            .handle(
                RejectVersionCommand {
                    version_id: v1,
                    reason: "nope".into(),
                },
                owner(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotInPendingApproval);
    }

    #[tokio::test]
    async fn requires_a_reason() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let v1 = submitted_version(&repo).await;
        let handler = RejectVersionHandler::new(repo);
        let err = handler
            .handle(
                RejectVersionCommand {
                    version_id: v1,
                    reason: "".into(),
                },
                owner(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}
