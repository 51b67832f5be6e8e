//! Repository for the `businesses` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::business::Business;

/// Column list for businesses queries.
const COLUMNS: &str = "id, name, language_code, inactivity_days, \
    vip_monthly_visits, vip_monthly_spending_cents, vip_total_visits, \
    vip_total_spending_cents, created_at";

/// Provides read access to businesses and their automation settings.
pub struct BusinessRepo;

impl BusinessRepo {
    /// Find a business by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Business>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM businesses WHERE id = $1");
        sqlx::query_as::<_, Business>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Ids of businesses that have at least one active automation of the given types.
    pub async fn list_ids_with_active_rules(
        pool: &PgPool,
        automation_types: &[String],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT business_id FROM automations \
             WHERE is_active AND automation_type = ANY($1) \
             ORDER BY business_id",
        )
        .bind(automation_types)
        .fetch_all(pool)
        .await
    }
}
