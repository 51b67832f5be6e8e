//! Repository for the `promotions` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::promotion::Promotion;

const COLUMNS: &str = "id, business_id, title, description, discount_percentage, \
    is_active, starts_at, ends_at, created_at";

pub struct PromotionRepo;

impl PromotionRepo {
    /// Find a promotion by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Promotion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM promotions WHERE id = $1");
        sqlx::query_as::<_, Promotion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
