//! VIP criteria arithmetic and the shared activity window.
//!
//! One boundary is used everywhere: with `elapsed = now - last_interaction`,
//! a customer is inactive iff `elapsed >= threshold`, and monthly figures
//! count iff `elapsed < window`. The two predicates are exact complements.

use chrono::Duration;
use serde::Serialize;

use crate::types::Timestamp;

/// Default length of the "monthly" window and of the inactivity threshold.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Whether `last_interaction` falls inside the window ending at `now`.
pub fn is_within_window(last_interaction: Timestamp, now: Timestamp, window: Duration) -> bool {
    now - last_interaction < window
}

/// Whether the customer has been away for at least `threshold`.
pub fn is_inactive(last_interaction: Timestamp, now: Timestamp, threshold: Duration) -> bool {
    !is_within_window(last_interaction, now, threshold)
}

/// Whole days elapsed since `last_interaction` (never negative).
pub fn days_since(last_interaction: Timestamp, now: Timestamp) -> i64 {
    (now - last_interaction).num_days().max(0)
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

/// The activity numbers VIP criteria are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityFigures {
    pub monthly_visits: i64,
    pub monthly_spending_cents: i64,
    pub total_visits: i64,
    pub total_spending_cents: i64,
}

impl ActivityFigures {
    /// Derive figures from a customer's lifetime counters.
    ///
    /// Monthly figures equal the lifetime counters when the last interaction
    /// is inside the window, and zero otherwise.
    pub fn from_customer(
        visit_count: i32,
        total_spent_cents: i64,
        last_interaction: Timestamp,
        now: Timestamp,
        window: Duration,
    ) -> Self {
        let total_visits = i64::from(visit_count.max(0));
        let total_spending_cents = total_spent_cents.max(0);
        let active = is_within_window(last_interaction, now, window);
        Self {
            monthly_visits: if active { total_visits } else { 0 },
            monthly_spending_cents: if active { total_spending_cents } else { 0 },
            total_visits,
            total_spending_cents,
        }
    }
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Which threshold qualified a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VipThreshold {
    MonthlyVisits,
    MonthlySpending,
    TotalVisits,
    TotalSpending,
}

/// Business-configured VIP thresholds. `None` (or a non-positive value)
/// means the threshold is not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VipCriteria {
    pub monthly_visits: Option<i64>,
    pub monthly_spending_cents: Option<i64>,
    pub total_visits: Option<i64>,
    pub total_spending_cents: Option<i64>,
}

impl VipCriteria {
    /// Whether at least one threshold is configured.
    pub fn is_configured(&self) -> bool {
        [
            self.monthly_visits,
            self.monthly_spending_cents,
            self.total_visits,
            self.total_spending_cents,
        ]
        .into_iter()
        .any(|limit| limit.is_some_and(|l| l > 0))
    }

    /// Logical OR over every configured threshold.
    ///
    /// Returns the first threshold met, in declaration order, or `None` when
    /// no configured threshold is reached.
    pub fn first_met(&self, figures: &ActivityFigures) -> Option<VipThreshold> {
        let pairs = [
            (VipThreshold::MonthlyVisits, self.monthly_visits, figures.monthly_visits),
            (
                VipThreshold::MonthlySpending,
                self.monthly_spending_cents,
                figures.monthly_spending_cents,
            ),
            (VipThreshold::TotalVisits, self.total_visits, figures.total_visits),
            (
                VipThreshold::TotalSpending,
                self.total_spending_cents,
                figures.total_spending_cents,
            ),
        ];
        pairs
            .into_iter()
            .find(|(_, limit, value)| limit.is_some_and(|l| l > 0 && *value >= l))
            .map(|(which, _, _)| which)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 8, 27, 12, 0, 0).unwrap()
    }

    fn window() -> Duration {
        Duration::days(DEFAULT_WINDOW_DAYS)
    }

    #[test]
    fn window_and_inactivity_are_complements() {
        let exactly_30 = now() - Duration::days(30);
        assert!(!is_within_window(exactly_30, now(), window()));
        assert!(is_inactive(exactly_30, now(), window()));

        let just_inside = exactly_30 + Duration::seconds(1);
        assert!(is_within_window(just_inside, now(), window()));
        assert!(!is_inactive(just_inside, now(), window()));
    }

    #[test]
    fn stale_customer_contributes_zero_monthly_figures() {
        let figures =
            ActivityFigures::from_customer(40, 900_000, now() - Duration::days(31), now(), window());
        assert_eq!(figures.monthly_visits, 0);
        assert_eq!(figures.monthly_spending_cents, 0);
        assert_eq!(figures.total_visits, 40);
        assert_eq!(figures.total_spending_cents, 900_000);
    }

    #[test]
    fn stale_customer_fails_monthly_only_criteria() {
        let criteria = VipCriteria {
            monthly_visits: Some(10),
            monthly_spending_cents: Some(50_000),
            ..Default::default()
        };
        let figures =
            ActivityFigures::from_customer(40, 900_000, now() - Duration::days(31), now(), window());
        assert_eq!(criteria.first_met(&figures), None);
    }

    #[test]
    fn total_visits_alone_qualifies() {
        let criteria = VipCriteria {
            monthly_visits: Some(50),
            monthly_spending_cents: Some(1_000_000),
            total_visits: Some(10),
            total_spending_cents: Some(1_000_000),
        };
        let figures = ActivityFigures::from_customer(12, 0, now(), now(), window());
        assert_eq!(criteria.first_met(&figures), Some(VipThreshold::TotalVisits));
    }

    #[test]
    fn threshold_is_inclusive() {
        let criteria = VipCriteria {
            total_spending_cents: Some(10_000),
            ..Default::default()
        };
        let figures = ActivityFigures::from_customer(0, 10_000, now(), now(), window());
        assert_eq!(criteria.first_met(&figures), Some(VipThreshold::TotalSpending));
    }

    #[test]
    fn unconfigured_criteria_never_qualify() {
        let criteria = VipCriteria {
            total_visits: Some(0),
            ..Default::default()
        };
        assert!(!criteria.is_configured());
        let figures = ActivityFigures::from_customer(500, 500_000, now(), now(), window());
        assert_eq!(criteria.first_met(&figures), None);
    }

    #[test]
    fn days_since_never_negative() {
        assert_eq!(days_since(now() + Duration::days(2), now()), 0);
        assert_eq!(days_since(now() - Duration::days(45), now()), 45);
    }
}
