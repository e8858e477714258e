//! Workflow roles used for decision gating and assignment routing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// The roles that participate in a test cycle.
///
/// Roles are resolved to concrete users by the external identity provider;
/// within the domain they gate which decision field a user may write and
/// who an assignment is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tester,
    ReportOwner,
    DataOwner,
    DataExecutive,
    Admin,
}

impl Role {
    /// All roles, in no particular order.
    pub fn all() -> &'static [Role] {
        &[
            Role::Tester,
            Role::ReportOwner,
            Role::DataOwner,
            Role::DataExecutive,
            Role::Admin,
        ]
    }

    /// Returns the stable string form used in persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tester => "tester",
            Role::ReportOwner => "report_owner",
            Role::DataOwner => "data_owner",
            Role::DataExecutive => "data_executive",
            Role::Admin => "admin",
        }
    }

    /// Returns true if this role may set manual overrides on phases.
    pub fn can_override(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tester" => Ok(Role::Tester),
            "report_owner" => Ok(Role::ReportOwner),
            "data_owner" => Ok(Role::DataOwner),
            "data_executive" => Ok(Role::DataExecutive),
            "admin" => Ok(Role::Admin),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}
