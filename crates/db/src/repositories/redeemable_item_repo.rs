//! Repository for the `redeemable_items` reward catalog.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::redeemable_item::RedeemableItem;

const COLUMNS: &str = "id, business_id, name, points_required, is_active, created_at";

pub struct RedeemableItemRepo;

impl RedeemableItemRepo {
    /// The cheapest active item costing at least `points`.
    ///
    /// Ties on cost resolve to the lowest id.
    pub async fn next_reward(
        pool: &PgPool,
        business_id: DbId,
        points: i32,
    ) -> Result<Option<RedeemableItem>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM redeemable_items \
             WHERE business_id = $1 AND is_active AND points_required >= $2 \
             ORDER BY points_required ASC, id ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, RedeemableItem>(&query)
            .bind(business_id)
            .bind(points)
            .fetch_optional(pool)
            .await
    }
}
