//! Repository for the `automations` rule table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::automation::AutomationRule;

/// Column list for automations queries.
const COLUMNS: &str = "id, business_id, automation_type, trigger_offset, is_active, \
    message_template, promotion_id, created_at";

/// Read-only access to automation rules.
pub struct AutomationRepo;

impl AutomationRepo {
    /// Active rules of a business restricted to the given automation types.
    ///
    /// Ordered by id so that among duplicate rules the first created wins.
    pub async fn list_active_for_business(
        pool: &PgPool,
        business_id: DbId,
        automation_types: &[String],
    ) -> Result<Vec<AutomationRule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automations \
             WHERE business_id = $1 AND is_active AND automation_type = ANY($2) \
             ORDER BY id"
        );
        sqlx::query_as::<_, AutomationRule>(&query)
            .bind(business_id)
            .bind(automation_types)
            .fetch_all(pool)
            .await
    }
}
