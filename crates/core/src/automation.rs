//! Automation type, sweep family and status vocabulary.
//!
//! The string forms returned by the `as_str` methods are the values stored in
//! the `automations.automation_type`, `automation_logs.status` and
//! `automation_execution_logs.status` columns. They must not change without a
//! migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Tag added to customers promoted by VIP evaluation. Never removed by the engine.
pub const VIP_TAG: &str = "VIP";

// ---------------------------------------------------------------------------
// AutomationType
// ---------------------------------------------------------------------------

/// The kind of lifecycle automation a rule describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationType {
    Birthday,
    VipEvaluation,
    Inactive,
    PointsNotification,
    MissingFields,
}

impl AutomationType {
    pub const ALL: [AutomationType; 5] = [
        AutomationType::Birthday,
        AutomationType::VipEvaluation,
        AutomationType::Inactive,
        AutomationType::PointsNotification,
        AutomationType::MissingFields,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AutomationType::Birthday => "birthday",
            AutomationType::VipEvaluation => "vip_evaluation",
            AutomationType::Inactive => "inactive",
            AutomationType::PointsNotification => "points_notification",
            AutomationType::MissingFields => "missing_fields",
        }
    }

    /// Whether a successful effect of this type requires an outbound message.
    ///
    /// VIP evaluation's primary effect is the tag mutation; its message is optional.
    pub fn requires_message(self) -> bool {
        !matches!(self, AutomationType::VipEvaluation)
    }
}

impl fmt::Display for AutomationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AutomationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown automation type: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// SweepFamily
// ---------------------------------------------------------------------------

/// A rule family a periodic sweep can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepFamily {
    Birthday,
    Vip,
    Inactive,
    MissingFields,
    Points,
}

impl SweepFamily {
    /// Families in the order `run-all` executes them.
    pub const RUN_ALL: [SweepFamily; 5] = [
        SweepFamily::Birthday,
        SweepFamily::Vip,
        SweepFamily::Inactive,
        SweepFamily::MissingFields,
        SweepFamily::Points,
    ];

    /// Path segment used by the scheduler endpoint (`/automations/{family}`).
    pub fn as_str(self) -> &'static str {
        match self {
            SweepFamily::Birthday => "birthday",
            SweepFamily::Vip => "vip",
            SweepFamily::Inactive => "inactive",
            SweepFamily::MissingFields => "missing-fields",
            SweepFamily::Points => "points",
        }
    }

    /// The single automation type a sweep of this family evaluates.
    pub fn automation_type(self) -> AutomationType {
        match self {
            SweepFamily::Birthday => AutomationType::Birthday,
            SweepFamily::Vip => AutomationType::VipEvaluation,
            SweepFamily::Inactive => AutomationType::Inactive,
            SweepFamily::MissingFields => AutomationType::MissingFields,
            SweepFamily::Points => AutomationType::PointsNotification,
        }
    }

    /// Value written to `automation_execution_logs.event_type`.
    pub fn log_event_type(self) -> String {
        format!("sweep.{}", self.as_str())
    }
}

impl fmt::Display for SweepFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepFamily {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SweepFamily::RUN_ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown automation family: '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Statuses
// ---------------------------------------------------------------------------

/// Outcome status of an automation effect record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectStatus {
    /// Claimed, dispatch outcome not yet recorded.
    Pending,
    Sent,
    Failed,
    /// Claimed and finalised without an outbound message.
    Skipped,
}

impl EffectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EffectStatus::Pending => "pending",
            EffectStatus::Sent => "sent",
            EffectStatus::Failed => "failed",
            EffectStatus::Skipped => "skipped",
        }
    }

    /// Only a failed record may be claimed again for the same epoch.
    pub fn is_reclaimable(self) -> bool {
        matches!(self, EffectStatus::Failed)
    }
}

impl FromStr for EffectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EffectStatus::Pending),
            "sent" => Ok(EffectStatus::Sent),
            "failed" => Ok(EffectStatus::Failed),
            "skipped" => Ok(EffectStatus::Skipped),
            other => Err(CoreError::Validation(format!(
                "Unknown effect status: '{other}'"
            ))),
        }
    }
}

/// Status of an execution log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Started,
    Completed,
    Error,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Started => "started",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automation_type_parses_stored_names() {
        for t in AutomationType::ALL {
            assert_eq!(t.as_str().parse::<AutomationType>().unwrap(), t);
        }
    }

    #[test]
    fn unknown_automation_type_is_validation_error() {
        let err = "anniversary".parse::<AutomationType>().unwrap_err();
        assert!(err.to_string().contains("anniversary"));
    }

    #[test]
    fn family_parses_path_segments() {
        assert_eq!(
            "missing-fields".parse::<SweepFamily>().unwrap(),
            SweepFamily::MissingFields
        );
        assert_eq!("vip".parse::<SweepFamily>().unwrap(), SweepFamily::Vip);
        assert!("run-all".parse::<SweepFamily>().is_err());
    }

    #[test]
    fn family_maps_to_single_automation_type() {
        assert_eq!(
            SweepFamily::Points.automation_type(),
            AutomationType::PointsNotification
        );
        assert_eq!(SweepFamily::Vip.log_event_type(), "sweep.vip");
    }

    #[test]
    fn only_failed_effects_are_reclaimable() {
        assert!(EffectStatus::Failed.is_reclaimable());
        assert!(!EffectStatus::Sent.is_reclaimable());
        assert!(!EffectStatus::Skipped.is_reclaimable());
        assert!(!EffectStatus::Pending.is_reclaimable());
    }

    #[test]
    fn vip_is_the_only_type_without_mandatory_message() {
        let optional: Vec<_> = AutomationType::ALL
            .into_iter()
            .filter(|t| !t.requires_message())
            .collect();
        assert_eq!(optional, vec![AutomationType::VipEvaluation]);
    }
}
