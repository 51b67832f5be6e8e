//! Message template parameter contracts.
//!
//! The messaging provider rejects a template whose body parameter count does
//! not match its registered definition, so the count and order for each
//! automation type are fixed here and checked before anything is claimed.

use crate::automation::AutomationType;

/// Parameter names, in order, expected by the template of each automation type.
pub fn parameter_names(automation_type: AutomationType) -> &'static [&'static str] {
    match automation_type {
        AutomationType::Birthday => &["customer_name", "offer_text"],
        AutomationType::VipEvaluation => &["customer_name", "offer_text"],
        AutomationType::Inactive => &["customer_name", "days_inactive", "offer_text"],
        AutomationType::PointsNotification => &["customer_name", "points_added", "reward_text"],
        AutomationType::MissingFields => &["customer_name", "missing_fields"],
    }
}

/// Number of body parameters the template of `automation_type` expects.
pub fn expected_parameter_count(automation_type: AutomationType) -> usize {
    parameter_names(automation_type).len()
}

/// Profile attributes a customer is prompted to complete.
pub const REQUIRED_PROFILE_FIELDS: &[&str] = &["birthday", "email"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_notification_has_three_parameters() {
        assert_eq!(
            parameter_names(AutomationType::PointsNotification),
            &["customer_name", "points_added", "reward_text"]
        );
    }

    #[test]
    fn every_contract_starts_with_customer_name() {
        for t in AutomationType::ALL {
            assert_eq!(parameter_names(t)[0], "customer_name", "{t}");
        }
    }
}
