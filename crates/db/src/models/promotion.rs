//! Promotion model.

use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `promotions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Promotion {
    pub id: DbId,
    pub business_id: DbId,
    pub title: String,
    pub description: String,
    pub discount_percentage: Option<i32>,
    pub is_active: bool,
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Promotion {
    /// Active flag set and `now` inside the optional validity window.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.is_active
            && self.starts_at.map_or(true, |start| start <= now)
            && self.ends_at.map_or(true, |end| now < end)
    }
}
