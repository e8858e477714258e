//! Phase SLA configuration

use serde::Deserialize;
use std::collections::HashMap;

use super::error::ValidationError;
use crate::domain::phase::{PhaseName, PhaseSequence, SlaPolicy};

/// Phase SLA configuration.
///
/// Durations are in days. Per-phase overrides are keyed by the phase's
/// snake_case name; phases without an override use `default_days`.
#[derive(Debug, Clone, Deserialize)]
pub struct SlaConfig {
    /// SLA days for phases without an explicit entry.
    #[serde(default = "default_days")]
    pub default_days: i64,

    /// Days before the due date at which a phase turns AtRisk.
    #[serde(default = "default_warning_days")]
    pub warning_days: i64,

    /// Per-phase SLA overrides, e.g. `test_execution = 14`.
    #[serde(default)]
    pub phase_days: HashMap<String, i64>,
}

impl SlaConfig {
    /// Validate SLA configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_days <= 0 || self.phase_days.values().any(|d| *d <= 0) {
            return Err(ValidationError::NonPositiveSlaDays);
        }
        let min_days = self
            .phase_days
            .values()
            .copied()
            .chain(std::iter::once(self.default_days))
            .min()
            .unwrap_or(self.default_days);
        if self.warning_days >= min_days {
            return Err(ValidationError::WarningWindowTooLarge);
        }
        // Unknown phase keys are configuration typos.
        for key in self.phase_days.keys() {
            if key.parse::<PhaseName>().is_err() {
                return Err(ValidationError::MissingRequired("known phase name in sla.phase_days"));
            }
        }
        Ok(())
    }

    /// Builds the domain policy from this configuration.
    pub fn to_policy(&self) -> SlaPolicy {
        let phase_days = PhaseSequence::all()
            .iter()
            .filter_map(|phase| {
                self.phase_days
                    .get(phase.as_str())
                    .map(|days| (*phase, *days))
            })
            .collect();
        SlaPolicy::new(phase_days, self.default_days, self.warning_days)
    }
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            default_days: default_days(),
            warning_days: default_warning_days(),
            phase_days: HashMap::new(),
        }
    }
}

fn default_days() -> i64 {
    7
}

fn default_warning_days() -> i64 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SlaConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_days() {
        let config = SlaConfig {
            default_days: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::NonPositiveSlaDays));
    }

    #[test]
    fn rejects_warning_window_wider_than_sla() {
        let config = SlaConfig {
            default_days: 7,
            warning_days: 7,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::WarningWindowTooLarge)
        );
    }

    #[test]
    fn rejects_unknown_phase_key() {
        let mut phase_days = HashMap::new();
        phase_days.insert("warp_drive_check".to_string(), 5);
        let config = SlaConfig {
            phase_days,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn to_policy_applies_overrides() {
        let mut phase_days = HashMap::new();
        phase_days.insert("test_execution".to_string(), 21);
        let config = SlaConfig {
            default_days: 7,
            warning_days: 3,
            phase_days,
        };
        let policy = config.to_policy();
        assert_eq!(policy.days_for(PhaseName::TestExecution), 21);
        assert_eq!(policy.days_for(PhaseName::Planning), 7);
    }
}
