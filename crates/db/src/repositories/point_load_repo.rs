//! Repository for the `point_loads` table.

use cadence_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::point_load::{CreatePointLoad, PointLoad};

/// Column list for point_loads queries.
const COLUMNS: &str = "id, business_id, customer_id, points, amount_cents, created_at";

/// Records point loads and exposes them as points-notification epochs.
pub struct PointLoadRepo;

impl PointLoadRepo {
    /// Load points onto a customer.
    ///
    /// In one transaction: increments the customer's points, spend and visit
    /// count, refreshes `last_interaction`, and records the load. Returns
    /// `None` if the customer does not exist.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePointLoad,
    ) -> Result<Option<PointLoad>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let business_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE customers SET \
                points = points + $2, \
                total_spent_cents = total_spent_cents + $3, \
                visit_count = visit_count + 1, \
                last_interaction = NOW(), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING business_id",
        )
        .bind(input.customer_id)
        .bind(input.points)
        .bind(input.amount_cents)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(business_id) = business_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO point_loads (business_id, customer_id, points, amount_cents) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let load = sqlx::query_as::<_, PointLoad>(&query)
            .bind(business_id)
            .bind(input.customer_id)
            .bind(input.points)
            .bind(input.amount_cents)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(load))
    }

    /// Find a point load by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PointLoad>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM point_loads WHERE id = $1");
        sqlx::query_as::<_, PointLoad>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Loads created since `since` that never reached the points pipeline.
    ///
    /// Only businesses with an active `points_notification` rule qualify. A
    /// load counts as notified once any record exists for its epoch key,
    /// including offset variants (`load-<id>/d<n>`).
    pub async fn list_unnotified_since(
        pool: &PgPool,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<PointLoad>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM point_loads pl \
             WHERE pl.created_at >= $1 \
               AND ($2::BIGINT IS NULL OR pl.business_id = $2) \
               AND EXISTS ( \
                   SELECT 1 FROM automations a \
                   WHERE a.business_id = pl.business_id \
                     AND a.automation_type = 'points_notification' AND a.is_active) \
               AND NOT EXISTS ( \
                   SELECT 1 FROM automation_logs l \
                   WHERE l.business_id = pl.business_id \
                     AND l.customer_id = pl.customer_id \
                     AND l.automation_type = 'points_notification' \
                     AND (l.epoch_key = 'load-' || pl.id::TEXT \
                          OR l.epoch_key LIKE 'load-' || pl.id::TEXT || '/%')) \
             ORDER BY pl.created_at, pl.id",
            cols = prefixed_columns("pl"),
        );
        sqlx::query_as::<_, PointLoad>(&query)
            .bind(since)
            .bind(business_id)
            .fetch_all(pool)
            .await
    }
}

fn prefixed_columns(alias: &str) -> String {
    COLUMNS
        .split(", ")
        .map(|c| format!("{alias}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
