use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `redeemable_items` reward catalog.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RedeemableItem {
    pub id: DbId,
    pub business_id: DbId,
    pub name: String,
    pub points_required: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
}
