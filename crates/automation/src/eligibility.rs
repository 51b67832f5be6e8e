//! Pure eligibility evaluation.
//!
//! [`evaluate`] decides whether one rule applies to one customer right now
//! and, if so, which epoch key scopes the effect. It reads nothing but its
//! arguments, so the same inputs always give the same answer.

use cadence_core::automation::{AutomationType, SweepFamily, VIP_TAG};
use cadence_core::epoch;
use cadence_core::types::Timestamp;
use cadence_core::vip::{self, ActivityFigures, VipThreshold};
use cadence_db::models::automation::AutomationRule;
use cadence_db::models::business::Business;
use cadence_db::models::customer::Customer;
use cadence_events::AutomationEvent;
use chrono::Duration;
use serde::Serialize;

use crate::config::EngineConfig;

/// What started an evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerKind {
    Sweep(SweepFamily),
    Event(AutomationEvent),
}

impl TriggerKind {
    pub fn label(&self) -> &'static str {
        match self {
            TriggerKind::Sweep(_) => "sweep",
            TriggerKind::Event(_) => "event",
        }
    }

    /// Points added by the triggering load, if any.
    pub fn points_added(&self) -> Option<i32> {
        match self {
            TriggerKind::Event(AutomationEvent::PointsLoaded { points_added, .. }) => {
                Some(*points_added)
            }
            _ => None,
        }
    }
}

/// Everything besides the rule, customer and business that evaluation reads.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub now: Timestamp,
    pub trigger: &'a TriggerKind,
    pub config: &'a EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible {
        epoch_key: String,
        /// For VIP evaluation, the threshold that qualified the customer.
        vip_threshold: Option<VipThreshold>,
    },
    Ineligible(IneligibleReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleReason {
    RuleInactive,
    UnknownRuleType,
    OtherBusiness,
    NoPhone,
    NoBirthday,
    NotBirthday,
    AlreadyVip,
    VipCriteriaNotConfigured,
    VipCriteriaNotMet,
    RecentlyActive,
    ProfileComplete,
    NoPointLoad,
}

fn eligible(epoch_key: String) -> Eligibility {
    Eligibility::Eligible {
        epoch_key,
        vip_threshold: None,
    }
}

/// Inactivity threshold in days: the rule's offset, else the business
/// setting, else the engine default.
pub fn inactivity_threshold_days(rule: &AutomationRule, business: &Business, config: &EngineConfig) -> i64 {
    if rule.trigger_offset > 0 {
        return i64::from(rule.trigger_offset);
    }
    business
        .inactivity_days
        .filter(|d| *d > 0)
        .map(i64::from)
        .unwrap_or(config.default_inactivity_days)
}

/// Decide whether `rule` applies to `customer` under `ctx`.
pub fn evaluate(
    rule: &AutomationRule,
    customer: &Customer,
    business: &Business,
    ctx: &EvaluationContext<'_>,
) -> Eligibility {
    use IneligibleReason::*;

    if !rule.is_active {
        return Eligibility::Ineligible(RuleInactive);
    }
    if rule.business_id != business.id || customer.business_id != business.id {
        return Eligibility::Ineligible(OtherBusiness);
    }
    let Ok(kind) = rule.kind() else {
        return Eligibility::Ineligible(UnknownRuleType);
    };
    if kind.requires_message() && !customer.has_phone() {
        return Eligibility::Ineligible(NoPhone);
    }

    let today = ctx.now.date_naive();

    match kind {
        AutomationType::Birthday => {
            let Some(birthday) = customer.birthday else {
                return Eligibility::Ineligible(NoBirthday);
            };
            match epoch::birthday_epoch_year(birthday, today, rule.trigger_offset) {
                Some(year) => eligible(epoch::with_offset(epoch::year_key(year), rule.trigger_offset)),
                None => Eligibility::Ineligible(NotBirthday),
            }
        }

        AutomationType::VipEvaluation => {
            if customer.has_tag(VIP_TAG) {
                return Eligibility::Ineligible(AlreadyVip);
            }
            let criteria = business.vip_criteria();
            if !criteria.is_configured() {
                return Eligibility::Ineligible(VipCriteriaNotConfigured);
            }
            let figures = ActivityFigures::from_customer(
                customer.visit_count,
                customer.total_spent_cents,
                customer.last_interaction,
                ctx.now,
                Duration::days(ctx.config.activity_window_days),
            );
            match criteria.first_met(&figures) {
                Some(threshold) => Eligibility::Eligible {
                    epoch_key: epoch::VIP_EPOCH_KEY.to_string(),
                    vip_threshold: Some(threshold),
                },
                None => Eligibility::Ineligible(VipCriteriaNotMet),
            }
        }

        AutomationType::Inactive => {
            let threshold = Duration::days(inactivity_threshold_days(rule, business, ctx.config));
            if vip::is_inactive(customer.last_interaction, ctx.now, threshold) {
                eligible(epoch::with_offset(epoch::iso_week_key(today), rule.trigger_offset))
            } else {
                Eligibility::Ineligible(RecentlyActive)
            }
        }

        AutomationType::PointsNotification => match ctx.trigger {
            TriggerKind::Event(AutomationEvent::PointsLoaded {
                customer_id,
                load_id,
                ..
            }) if *customer_id == customer.id => {
                eligible(epoch::with_offset(epoch::points_load_key(*load_id), rule.trigger_offset))
            }
            _ => Eligibility::Ineligible(NoPointLoad),
        },

        AutomationType::MissingFields => {
            if customer.missing_profile_fields().is_empty() {
                Eligibility::Ineligible(ProfileComplete)
            } else {
                eligible(epoch::with_offset(epoch::day_key(today), rule.trigger_offset))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::fixtures::{business, customer, rule};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 8, 27, 9, 0, 0).unwrap()
    }

    fn sweep(family: SweepFamily) -> TriggerKind {
        TriggerKind::Sweep(family)
    }

    fn run(
        rule: &AutomationRule,
        customer: &Customer,
        business: &Business,
        trigger: &TriggerKind,
    ) -> Eligibility {
        let config = EngineConfig::default();
        evaluate(
            rule,
            customer,
            business,
            &EvaluationContext {
                now: now(),
                trigger,
                config: &config,
            },
        )
    }

    #[test]
    fn birthday_today_is_eligible_for_the_year() {
        let b = business(1);
        let mut c = customer(10, 1);
        c.birthday = NaiveDate::from_ymd_opt(1988, 8, 27);
        let r = rule(100, 1, AutomationType::Birthday, "bday");

        assert_matches!(
            run(&r, &c, &b, &sweep(SweepFamily::Birthday)),
            Eligibility::Eligible { epoch_key, .. } if epoch_key == "2025"
        );
    }

    #[test]
    fn birthday_other_day_or_unknown_is_ineligible() {
        let b = business(1);
        let r = rule(100, 1, AutomationType::Birthday, "bday");
        let mut c = customer(10, 1);

        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::Birthday)),
            Eligibility::Ineligible(IneligibleReason::NotBirthday)
        );
        c.birthday = None;
        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::Birthday)),
            Eligibility::Ineligible(IneligibleReason::NoBirthday)
        );
    }

    #[test]
    fn reminder_rule_gets_distinct_epoch() {
        let b = business(1);
        let mut c = customer(10, 1);
        c.birthday = NaiveDate::from_ymd_opt(1988, 9, 3);
        let mut r = rule(100, 1, AutomationType::Birthday, "bday_soon");
        r.trigger_offset = 7;

        assert_matches!(
            run(&r, &c, &b, &sweep(SweepFamily::Birthday)),
            Eligibility::Eligible { epoch_key, .. } if epoch_key == "2025/d7"
        );
    }

    #[test]
    fn message_types_need_a_phone_but_vip_does_not() {
        let mut b = business(1);
        b.vip_total_visits = Some(5);
        let mut c = customer(10, 1);
        c.phone = "  ".into();
        c.visit_count = 9;
        c.birthday = NaiveDate::from_ymd_opt(1988, 8, 27);

        let bday = rule(100, 1, AutomationType::Birthday, "bday");
        assert_eq!(
            run(&bday, &c, &b, &sweep(SweepFamily::Birthday)),
            Eligibility::Ineligible(IneligibleReason::NoPhone)
        );

        let vip_rule = rule(101, 1, AutomationType::VipEvaluation, "");
        assert_matches!(
            run(&vip_rule, &c, &b, &sweep(SweepFamily::Vip)),
            Eligibility::Eligible { vip_threshold: Some(VipThreshold::TotalVisits), .. }
        );
    }

    #[test]
    fn vip_requires_configured_criteria_and_no_tag() {
        let mut b = business(1);
        let mut c = customer(10, 1);
        c.visit_count = 100;
        let r = rule(100, 1, AutomationType::VipEvaluation, "vip");

        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::Vip)),
            Eligibility::Ineligible(IneligibleReason::VipCriteriaNotConfigured)
        );

        b.vip_total_visits = Some(10);
        c.tags.push(VIP_TAG.into());
        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::Vip)),
            Eligibility::Ineligible(IneligibleReason::AlreadyVip)
        );
    }

    #[test]
    fn stale_customer_misses_monthly_vip_criteria() {
        let mut b = business(1);
        b.vip_monthly_visits = Some(10);
        let mut c = customer(10, 1);
        c.visit_count = 40;
        c.last_interaction = now() - Duration::days(31);
        let r = rule(100, 1, AutomationType::VipEvaluation, "vip");

        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::Vip)),
            Eligibility::Ineligible(IneligibleReason::VipCriteriaNotMet)
        );
    }

    #[test]
    fn inactive_boundary_is_inclusive() {
        let b = business(1);
        let r = rule(100, 1, AutomationType::Inactive, "miss_you");
        let mut c = customer(10, 1);

        c.last_interaction = now() - Duration::days(30);
        assert_matches!(
            run(&r, &c, &b, &sweep(SweepFamily::Inactive)),
            Eligibility::Eligible { epoch_key, .. } if epoch_key == "2025-W35"
        );

        c.last_interaction = now() - Duration::days(29);
        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::Inactive)),
            Eligibility::Ineligible(IneligibleReason::RecentlyActive)
        );
    }

    #[test]
    fn inactivity_threshold_precedence() {
        let config = EngineConfig::default();
        let mut b = business(1);
        let mut r = rule(100, 1, AutomationType::Inactive, "miss_you");
        assert_eq!(inactivity_threshold_days(&r, &b, &config), 30);

        b.inactivity_days = Some(45);
        assert_eq!(inactivity_threshold_days(&r, &b, &config), 45);

        r.trigger_offset = 60;
        assert_eq!(inactivity_threshold_days(&r, &b, &config), 60);
    }

    #[test]
    fn points_rule_needs_matching_point_load() {
        let b = business(1);
        let c = customer(10, 1);
        let r = rule(100, 1, AutomationType::PointsNotification, "points");

        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::Points)),
            Eligibility::Ineligible(IneligibleReason::NoPointLoad)
        );

        let loaded = TriggerKind::Event(AutomationEvent::PointsLoaded {
            business_id: 1,
            customer_id: 10,
            load_id: 42,
            points_added: 15,
        });
        assert_matches!(
            run(&r, &c, &b, &loaded),
            Eligibility::Eligible { epoch_key, .. } if epoch_key == "load-42"
        );

        let someone_else = TriggerKind::Event(AutomationEvent::PointsLoaded {
            business_id: 1,
            customer_id: 11,
            load_id: 43,
            points_added: 15,
        });
        assert_eq!(
            run(&r, &c, &b, &someone_else),
            Eligibility::Ineligible(IneligibleReason::NoPointLoad)
        );
    }

    #[test]
    fn missing_fields_keyed_by_day() {
        let b = business(1);
        let r = rule(100, 1, AutomationType::MissingFields, "complete_profile");
        let mut c = customer(10, 1);
        let trigger = sweep(SweepFamily::MissingFields);

        assert_eq!(
            run(&r, &c, &b, &trigger),
            Eligibility::Ineligible(IneligibleReason::ProfileComplete)
        );

        c.email = None;
        assert_matches!(
            run(&r, &c, &b, &trigger),
            Eligibility::Eligible { epoch_key, .. } if epoch_key == "2025-08-27"
        );
    }

    #[test]
    fn inactive_or_foreign_rules_never_apply() {
        let b = business(1);
        let c = customer(10, 1);
        let mut r = rule(100, 1, AutomationType::MissingFields, "complete_profile");
        r.is_active = false;
        assert_eq!(
            run(&r, &c, &b, &sweep(SweepFamily::MissingFields)),
            Eligibility::Ineligible(IneligibleReason::RuleInactive)
        );

        let foreign = rule(101, 2, AutomationType::MissingFields, "complete_profile");
        assert_eq!(
            run(&foreign, &c, &b, &sweep(SweepFamily::MissingFields)),
            Eligibility::Ineligible(IneligibleReason::OtherBusiness)
        );
    }
}
