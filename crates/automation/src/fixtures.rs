//! Row constructors for seeding a [`MemoryStore`](crate::memory::MemoryStore).
//!
//! Every value not named in the signature gets a neutral default: no VIP
//! criteria, a complete profile, zero counters, no tags.

use cadence_core::automation::AutomationType;
use cadence_core::types::DbId;
use cadence_db::models::automation::AutomationRule;
use cadence_db::models::business::Business;
use cadence_db::models::customer::Customer;
use cadence_db::models::promotion::Promotion;
use cadence_db::models::redeemable_item::RedeemableItem;
use chrono::{NaiveDate, Utc};

pub fn business(id: DbId) -> Business {
    Business {
        id,
        name: format!("Business {id}"),
        language_code: None,
        inactivity_days: None,
        vip_monthly_visits: None,
        vip_monthly_spending_cents: None,
        vip_total_visits: None,
        vip_total_spending_cents: None,
        created_at: Utc::now(),
    }
}

pub fn customer(id: DbId, business_id: DbId) -> Customer {
    let now = Utc::now();
    Customer {
        id,
        business_id,
        phone: format!("52155500{id:05}"),
        name: format!("Customer {id}"),
        email: Some(format!("customer{id}@example.com")),
        birthday: NaiveDate::from_ymd_opt(1990, 1, 15),
        points: 0,
        total_spent_cents: 0,
        visit_count: 0,
        last_interaction: now,
        tags: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn rule(id: DbId, business_id: DbId, kind: AutomationType, template: &str) -> AutomationRule {
    AutomationRule {
        id,
        business_id,
        automation_type: kind.as_str().to_string(),
        trigger_offset: 0,
        is_active: true,
        message_template: template.to_string(),
        promotion_id: None,
        created_at: Utc::now(),
    }
}

pub fn item(id: DbId, business_id: DbId, name: &str, points_required: i32) -> RedeemableItem {
    RedeemableItem {
        id,
        business_id,
        name: name.to_string(),
        points_required,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub fn promotion(id: DbId, business_id: DbId, title: &str) -> Promotion {
    Promotion {
        id,
        business_id,
        title: title.to_string(),
        description: String::new(),
        discount_percentage: None,
        is_active: true,
        starts_at: None,
        ends_at: None,
        created_at: Utc::now(),
    }
}
