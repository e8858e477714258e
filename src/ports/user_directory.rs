//! User directory port - the identity/RBAC provider boundary.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LobId, Role, UserId};

/// Resolves the responsible user for a role within a line of business.
///
/// Resolution must be deterministic: exactly one holder is expected per
/// (role, LOB). Zero or more than one is a configuration defect and must
/// be surfaced as `ResolutionAmbiguous` carrying the role, the LOB, and
/// any candidate user ids - never silently resolved by picking a first
/// match.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve the single user holding `role` for `lob_id`.
    ///
    /// # Errors
    ///
    /// - `ResolutionAmbiguous` if zero or multiple holders exist
    /// - `DatabaseError` on provider failure
    async fn resolve_user(&self, role: Role, lob_id: LobId) -> Result<UserId, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_directory_is_object_safe() {
        fn _accepts_dyn(_dir: &dyn UserDirectory) {}
    }
}
