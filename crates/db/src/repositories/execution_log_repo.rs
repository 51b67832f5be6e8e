//! Repository for the append-only `automation_execution_logs` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::execution_log::{CreateExecutionLog, ExecutionLog};

/// Column list for automation_execution_logs queries.
const COLUMNS: &str = "id, run_id, business_id, event_type, status, customers_processed, \
    messages_sent, errors_count, execution_time_ms, details, created_at";

/// Appends and lists execution log rows. Rows are never updated.
pub struct ExecutionLogRepo;

impl ExecutionLogRepo {
    /// Append a new row, returning its id.
    pub async fn insert(pool: &PgPool, input: &CreateExecutionLog) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO automation_execution_logs \
                (run_id, business_id, event_type, status, customers_processed, \
                 messages_sent, errors_count, execution_time_ms, details) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(input.run_id)
        .bind(input.business_id)
        .bind(&input.event_type)
        .bind(&input.status)
        .bind(input.customers_processed)
        .bind(input.messages_sent)
        .bind(input.errors_count)
        .bind(input.execution_time_ms)
        .bind(&input.details)
        .fetch_one(pool)
        .await
    }

    /// List recent rows, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExecutionLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM automation_execution_logs \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, ExecutionLog>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
