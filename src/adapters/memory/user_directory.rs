//! Static in-memory implementation of UserDirectory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, LobId, Role, UserId};
use crate::ports::UserDirectory;

/// User directory backed by a static (role, LOB) -> users table.
///
/// Mirrors the role-holder data the identity provider would serve. Zero or
/// multiple holders resolve to `ResolutionAmbiguous`, exactly like the
/// production provider contract.
#[derive(Default)]
pub struct StaticUserDirectory {
    entries: Mutex<HashMap<(Role, LobId), Vec<UserId>>>,
}

impl StaticUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user as a holder of `role` for `lob_id`.
    pub fn grant(&self, role: Role, lob_id: LobId, user: UserId) {
        self.entries
            .lock()
            .expect("directory entries lock poisoned")
            .entry((role, lob_id))
            .or_default()
            .push(user);
    }

    /// Removes every holder of `role` for `lob_id`.
    pub fn revoke_all(&self, role: Role, lob_id: LobId) {
        self.entries
            .lock()
            .expect("directory entries lock poisoned")
            .remove(&(role, lob_id));
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn resolve_user(&self, role: Role, lob_id: LobId) -> Result<UserId, DomainError> {
        let entries = self.entries.lock().expect("directory entries lock poisoned");
        let holders = entries.get(&(role, lob_id)).cloned().unwrap_or_default();
        match holders.as_slice() {
            [single] => Ok(single.clone()),
            _ => {
                let candidates = holders
                    .iter()
                    .map(|u| u.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                Err(DomainError::new(
                    ErrorCode::ResolutionAmbiguous,
                    format!(
                        "Expected exactly one {} for LOB {}, found {}",
                        role,
                        lob_id,
                        holders.len()
                    ),
                )
                .with_detail("role", role.as_str())
                .with_detail("lob_id", lob_id.to_string())
                .with_detail("candidates", candidates))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lob() -> LobId {
        LobId::new(338).unwrap()
    }

    #[tokio::test]
    async fn resolves_single_holder() {
        let dir = StaticUserDirectory::new();
        dir.grant(Role::DataOwner, lob(), UserId::new("downer-7").unwrap());
        let user = dir.resolve_user(Role::DataOwner, lob()).await.unwrap();
        assert_eq!(user.as_str(), "downer-7");
    }

    #[tokio::test]
    async fn zero_holders_is_ambiguous() {
        let dir = StaticUserDirectory::new();
        let err = dir.resolve_user(Role::DataOwner, lob()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResolutionAmbiguous);
        assert_eq!(err.details.get("lob_id"), Some(&"338".to_string()));
    }

    #[tokio::test]
    async fn multiple_holders_is_ambiguous_with_candidates() {
        let dir = StaticUserDirectory::new();
        dir.grant(Role::DataOwner, lob(), UserId::new("downer-7").unwrap());
        dir.grant(Role::DataOwner, lob(), UserId::new("downer-8").unwrap());
        let err = dir.resolve_user(Role::DataOwner, lob()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ResolutionAmbiguous);
        let candidates = err.details.get("candidates").unwrap();
        assert!(candidates.contains("downer-7"));
        assert!(candidates.contains("downer-8"));
    }

    #[tokio::test]
    async fn resolution_is_per_role_and_lob() {
        let dir = StaticUserDirectory::new();
        dir.grant(Role::DataOwner, lob(), UserId::new("downer-7").unwrap());
        let other_lob = LobId::new(339).unwrap();
        assert!(dir.resolve_user(Role::DataOwner, other_lob).await.is_err());
        assert!(dir.resolve_user(Role::DataExecutive, lob()).await.is_err());
    }
}
