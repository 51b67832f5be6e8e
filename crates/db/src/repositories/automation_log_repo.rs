//! Repository for the `automation_logs` effect records.
//!
//! [`AutomationLogRepo::try_claim`] is the engine's only concurrency control:
//! a single `INSERT .. ON CONFLICT` against `uq_automation_logs_effect`.

use cadence_core::automation::EffectStatus;
use cadence_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::automation_log::{AutomationLog, ClaimedEffect, EffectKey};

/// Column list for automation_logs queries.
const COLUMNS: &str = "id, business_id, customer_id, automation_type, epoch_key, status, \
    detail, attempts, created_at, updated_at";

/// Provides claim and outcome operations on effect records.
pub struct AutomationLogRepo;

impl AutomationLogRepo {
    /// Atomically claim the right to act on an effect identity.
    ///
    /// Inserts a `pending` row, or re-claims an existing row whose status is
    /// `failed`. Returns `None` when the identity is already pending, sent or
    /// skipped.
    pub async fn try_claim(
        pool: &PgPool,
        key: &EffectKey,
    ) -> Result<Option<ClaimedEffect>, sqlx::Error> {
        sqlx::query_as::<_, ClaimedEffect>(
            "INSERT INTO automation_logs \
                (business_id, customer_id, automation_type, epoch_key, status) \
             VALUES ($1, $2, $3, $4, 'pending') \
             ON CONFLICT ON CONSTRAINT uq_automation_logs_effect DO UPDATE \
                SET status = 'pending', \
                    attempts = automation_logs.attempts + 1, \
                    updated_at = NOW() \
                WHERE automation_logs.status = 'failed' \
             RETURNING id, attempts",
        )
        .bind(key.business_id)
        .bind(key.customer_id)
        .bind(&key.automation_type)
        .bind(&key.epoch_key)
        .fetch_optional(pool)
        .await
    }

    /// Record the outcome of a claimed effect.
    pub async fn record_outcome(
        pool: &PgPool,
        id: DbId,
        status: EffectStatus,
        detail: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE automation_logs SET status = $2, detail = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(detail)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find the record for an identity, if any.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &EffectKey,
    ) -> Result<Option<AutomationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automation_logs \
             WHERE business_id = $1 AND customer_id = $2 \
               AND automation_type = $3 AND epoch_key = $4"
        );
        sqlx::query_as::<_, AutomationLog>(&query)
            .bind(key.business_id)
            .bind(key.customer_id)
            .bind(&key.automation_type)
            .bind(&key.epoch_key)
            .fetch_optional(pool)
            .await
    }

    /// Failed records of one automation type first claimed at or after
    /// `since`, oldest first. Re-claims bump `updated_at` only, so a record
    /// ages out of the window however often it is retried.
    pub async fn list_failed_since(
        pool: &PgPool,
        automation_type: &str,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<AutomationLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automation_logs \
             WHERE automation_type = $1 AND status = 'failed' AND created_at >= $2 \
               AND ($3::BIGINT IS NULL OR business_id = $3) \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, AutomationLog>(&query)
            .bind(automation_type)
            .bind(since)
            .bind(business_id)
            .fetch_all(pool)
            .await
    }
}
