//! Point-load operations.

use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `point_loads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PointLoad {
    pub id: DbId,
    pub business_id: DbId,
    pub customer_id: DbId,
    pub points: i32,
    pub amount_cents: i64,
    pub created_at: Timestamp,
}

/// Input for loading points onto a customer.
#[derive(Debug, Clone)]
pub struct CreatePointLoad {
    pub customer_id: DbId,
    pub points: i32,
    pub amount_cents: i64,
}
