//! Sweep/event execution log (`automation_execution_logs`).

use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `automation_execution_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExecutionLog {
    pub id: DbId,
    pub run_id: Uuid,
    pub business_id: Option<DbId>,
    pub event_type: String,
    pub status: String,
    pub customers_processed: i32,
    pub messages_sent: i32,
    pub errors_count: i32,
    pub execution_time_ms: i64,
    pub details: serde_json::Value,
    pub created_at: Timestamp,
}

/// Input for appending an execution log row.
#[derive(Debug, Clone)]
pub struct CreateExecutionLog {
    pub run_id: Uuid,
    pub business_id: Option<DbId>,
    pub event_type: String,
    pub status: String,
    pub customers_processed: i32,
    pub messages_sent: i32,
    pub errors_count: i32,
    pub execution_time_ms: i64,
    pub details: serde_json::Value,
}
