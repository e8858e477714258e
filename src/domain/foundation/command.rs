//! Command infrastructure for the application handlers.
//!
//! Every mutating handler accepts a single `CommandMetadata` carrying the
//! acting user and request-scoped context, instead of loose parameters.
//! The acting user is resolved by the external identity provider at the
//! API boundary; the domain only stamps it onto audit fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Metadata context for command handlers.
///
/// Carries the acting user plus correlation context through the command
/// processing pipeline. Handlers stamp `user_id` onto started_by,
/// completed_by, approved_by and similar audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The user executing this command.
    pub user_id: UserId,

    /// Links related operations across a single user request.
    /// Generated if the caller does not provide one.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Source of this command (e.g., "api", "sweep").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates new command metadata for the given acting user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            correlation_id: None,
            source: None,
        }
    }

    /// Sets an explicit correlation id.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Sets the command source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation id, generating a stable random one if unset.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the command source, if provided.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}
