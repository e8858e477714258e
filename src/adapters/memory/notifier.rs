//! Recording in-memory implementation of Notifier.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::domain::foundation::{AssignmentId, DomainError, ErrorCode, UserId};
use crate::ports::Notifier;

/// Notifier that records every delivery for assertions.
///
/// Can be flipped into a failing mode to verify that callers treat
/// notification as best-effort.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, AssignmentId)>>,
    fail: Mutex<bool>,
}

impl RecordingNotifier {
    /// Creates a notifier that records successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent deliveries fail.
    pub fn fail_deliveries(&self) {
        *self.fail.lock().expect("notifier fail flag poisoned") = true;
    }

    /// Everything delivered so far (test helper).
    pub fn sent(&self) -> Vec<(UserId, AssignmentId)> {
        self.sent.lock().expect("notifier sent lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        user_id: &UserId,
        assignment_id: AssignmentId,
    ) -> Result<(), DomainError> {
        if *self.fail.lock().expect("notifier fail flag poisoned") {
            return Err(DomainError::new(
                ErrorCode::NotificationError,
                "Simulated delivery failure",
            ));
        }
        self.sent
            .lock()
            .expect("notifier sent lock poisoned")
            .push((user_id.clone(), assignment_id));
        Ok(())
    }
}
