//! SubmitVersionHandler - moves a draft to PendingApproval.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, Timestamp, VersionId};
use crate::ports::VersionRepository;

/// Command to submit a draft for approval.
#[derive(Debug, Clone)]
pub struct SubmitVersionCommand {
    pub version_id: VersionId,
    pub notes: Option<String>,
}

/// Handler for submitting versions.
pub struct SubmitVersionHandler {
    version_repository: Arc<dyn VersionRepository>,
}

impl SubmitVersionHandler {
    pub fn new(version_repository: Arc<dyn VersionRepository>) -> Self {
        Self { version_repository }
    }

    pub async fn handle(
        &self,
        cmd: SubmitVersionCommand,
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

        chain.submit(cmd.version_id, &metadata.user_id, cmd.notes, Timestamp::now())?;
        self.version_repository.update(&chain).await?;

        tracing::info!(
            version_id = %cmd.version_id,
            phase = %chain.phase(),
            actor = %metadata.user_id,
            "version submitted for approval"
        );
        Ok(())
    }
}
