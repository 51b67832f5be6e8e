//! Business model and its automation settings.

use cadence_core::types::{DbId, Timestamp};
use cadence_core::vip::VipCriteria;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `businesses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Business {
    pub id: DbId,
    pub name: String,
    /// Template language override; falls back to the gateway default.
    pub language_code: Option<String>,
    pub inactivity_days: Option<i32>,
    pub vip_monthly_visits: Option<i64>,
    pub vip_monthly_spending_cents: Option<i64>,
    pub vip_total_visits: Option<i64>,
    pub vip_total_spending_cents: Option<i64>,
    pub created_at: Timestamp,
}

impl Business {
    pub fn vip_criteria(&self) -> VipCriteria {
        VipCriteria {
            monthly_visits: self.vip_monthly_visits,
            monthly_spending_cents: self.vip_monthly_spending_cents,
            total_visits: self.vip_total_visits,
            total_spending_cents: self.vip_total_spending_cents,
        }
    }
}
