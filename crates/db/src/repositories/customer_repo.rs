//! Repository for the `customers` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::customer::Customer;

/// Column list for customers queries.
const COLUMNS: &str = "id, business_id, phone, name, email, birthday, points, \
    total_spent_cents, visit_count, last_interaction, tags, created_at, updated_at";

/// Provides data-access methods for customers.
pub struct CustomerRepo;

impl CustomerRepo {
    /// Find a customer by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every customer of a business, oldest first.
    pub async fn list_for_business(
        pool: &PgPool,
        business_id: DbId,
    ) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE business_id = $1 ORDER BY id");
        sqlx::query_as::<_, Customer>(&query)
            .bind(business_id)
            .fetch_all(pool)
            .await
    }

    /// Add a tag unless already present. Returns `true` if the row changed.
    ///
    /// Concurrent callers race benignly: the `NOT (tag = ANY(tags))` guard
    /// keeps the array free of duplicates.
    pub async fn add_tag(pool: &PgPool, id: DbId, tag: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE customers SET tags = array_append(tags, $2), updated_at = NOW() \
             WHERE id = $1 AND NOT ($2 = ANY(tags))",
        )
        .bind(id)
        .bind(tag)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
