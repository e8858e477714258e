//! Notifier port - best-effort delivery boundary.

use async_trait::async_trait;

use crate::domain::foundation::{AssignmentId, DomainError, UserId};

/// Notifies a user that an assignment has been routed to them.
///
/// Delivery is at-least-once and best-effort, invoked after the routing
/// transaction commits; a notification failure must never roll back
/// persisted assignments. Callers log and continue.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify `user_id` about `assignment_id`.
    ///
    /// # Errors
    ///
    /// - `NotificationError` on delivery failure (non-fatal to callers)
    async fn notify(&self, user_id: &UserId, assignment_id: AssignmentId)
        -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifier_is_object_safe() {
        fn _accepts_dyn(_n: &dyn Notifier) {}
    }
}
