//! Customer model.

use cadence_core::templates::REQUIRED_PROFILE_FIELDS;
use cadence_core::types::{DbId, Timestamp};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `customers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: DbId,
    pub business_id: DbId,
    /// Channel address. Empty when the customer has not shared a phone.
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub points: i32,
    pub total_spent_cents: i64,
    pub visit_count: i32,
    pub last_interaction: Timestamp,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Customer {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn has_phone(&self) -> bool {
        !self.phone.trim().is_empty()
    }

    /// Required profile attributes that are still null (or blank).
    pub fn missing_profile_fields(&self) -> Vec<&'static str> {
        REQUIRED_PROFILE_FIELDS
            .iter()
            .copied()
            .filter(|field| match *field {
                "birthday" => self.birthday.is_none(),
                "email" => self.email.as_deref().map_or(true, |e| e.trim().is_empty()),
                _ => false,
            })
            .collect()
    }
}
