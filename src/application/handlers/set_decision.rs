//! SetDecisionHandler - records one role's decision on one item.
//!
//! The tester writes the tester field, the report owner writes the report
//! owner field; the two are fully independent. The caller's role comes
//! from the identity provider, not from the payload.

use std::sync::Arc;

use crate::domain::foundation::{
    CommandMetadata, DecisionItemId, DomainError, ErrorCode, Role, VersionId,
};
use crate::domain::version::Decision;
use crate::ports::VersionRepository;

/// Command to record a decision.
#[derive(Debug, Clone)]
pub struct SetDecisionCommand {
    pub version_id: VersionId,
    pub item_id: DecisionItemId,
    pub role: Role,
    pub decision: Decision,
    pub rationale: Option<String>,
}

/// Handler for recording decisions.
pub struct SetDecisionHandler {
    version_repository: Arc<dyn VersionRepository>,
}

impl SetDecisionHandler {
    pub fn new(version_repository: Arc<dyn VersionRepository>) -> Self {
        Self { version_repository }
    }

    pub async fn handle(
        &self,
        cmd: SetDecisionCommand,
        metadata: CommandMetadata,
    ) -> Result<(), DomainError> {
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

        chain.set_decision(
            cmd.version_id,
            cmd.item_id,
            cmd.role,
            cmd.decision,
            cmd.rationale,
        )?;
        self.version_repository.update(&chain).await?;

        tracing::debug!(
            version_id = %cmd.version_id,
            item_id = %cmd.item_id,
            role = %cmd.role,
            decision = %cmd.decision,
            actor = %metadata.user_id,
            "decision recorded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryVersionRepository;
    use crate::domain::foundation::{LobId, Timestamp, UserId, WorkflowId};
    use crate::domain::phase::PhaseName;
    use crate::domain::version::{DecisionItem, VersionChain};

    fn metadata() -> CommandMetadata {
        CommandMetadata::new(UserId::new("tester-1").unwrap())
    }

    async fn draft_with_item(
        repo: &Arc<InMemoryVersionRepository>,
    ) -> (VersionId, DecisionItemId) {
        let mut chain = VersionChain::new(WorkflowId::new(), PhaseName::Scoping);
        let v1 = chain
            .create_draft(None, &UserId::new("tester-1").unwrap(), Timestamp::now())
            .unwrap();
        let item_id = chain
            .add_item(v1, DecisionItem::new("attr-401", LobId::new(338).unwrap(), true).unwrap())
            .unwrap();
        repo.save(&chain).await.unwrap();
        (v1, item_id)
    }

    #[tokio::test]
    async fn records_tester_decision_with_rationale() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let (v1, item_id) = draft_with_item(&repo).await;
        let handler = SetDecisionHandler::new(repo.clone());

        handler
            .handle(
                SetDecisionCommand {
                    version_id: v1,
                    item_id,
                    role: Role::Tester,
                    decision: Decision::Approved,
                    rationale: Some("key attribute".into()),
                },
                metadata(),
            )
            .await
            .unwrap();

        let chain = repo.find_by_version(&v1).await.unwrap().unwrap();
        let item = chain.version(v1).unwrap().item(item_id).unwrap();
        assert_eq!(item.tester_decision(), Decision::Approved);
        assert_eq!(item.tester_rationale(), Some("key attribute"));
        assert_eq!(item.report_owner_decision(), Decision::Pending);
    }

    #[tokio::test]
    async fn decision_roles_write_independent_fields() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let (v1, item_id) = draft_with_item(&repo).await;
        let handler = SetDecisionHandler::new(repo.clone());

        handler
            .handle(
                SetDecisionCommand {
                    version_id: v1,
                    item_id,
                    role: Role::Tester,
                    decision: Decision::Rejected,
                    rationale: None,
                },
                metadata(),
            )
            .await
            .unwrap();
        handler
            .handle(
                SetDecisionCommand {
                    version_id: v1,
                    item_id,
                    role: Role::ReportOwner,
                    decision: Decision::Approved,
                    rationale: None,
                },
                metadata(),
            )
            .await
            .unwrap();

        let chain = repo.find_by_version(&v1).await.unwrap().unwrap();
        let item = chain.version(v1).unwrap().item(item_id).unwrap();
        assert_eq!(item.tester_decision(), Decision::Rejected);
        assert_eq!(item.report_owner_decision(), Decision::Approved);
    }

    #[tokio::test]
    async fn non_decision_role_is_rejected() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let (v1, item_id) = draft_with_item(&repo).await;
        let handler = SetDecisionHandler::new(repo);

        let err = handler
            .handle(
                SetDecisionCommand {
                    version_id: v1,
                    item_id,
                    role: Role::Admin,
                    decision: Decision::Approved,
                    rationale: None,
                },
                metadata(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RoleMismatch);
    }

    #[tokio::test]
    async fn unknown_item_fails() {
        let repo = Arc::new(InMemoryVersionRepository::new());
        let (v1, _) = draft_with_item(&repo).await;
        let handler = SetDecisionHandler::new(repo);

        let err = handler
            .handle(
                SetDecisionCommand {
                    version_id: v1,
                    item_id: DecisionItemId::new(),
                    role: Role::Tester,
                    decision: Decision::Approved,
                    rationale: None,
                },
                metadata(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DecisionItemNotFound);
    }
}
