//! Automation effect records (`automation_logs`).
//!
//! One row per `(business, customer, automation type, epoch key)`; the row is
//! both the dedup marker and the audit trail of what was sent.

use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `automation_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AutomationLog {
    pub id: DbId,
    pub business_id: DbId,
    pub customer_id: DbId,
    pub automation_type: String,
    pub epoch_key: String,
    pub status: String,
    /// Template name, parameters, gateway message id or error.
    pub detail: serde_json::Value,
    pub attempts: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Identity of an effect record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectKey {
    pub business_id: DbId,
    pub customer_id: DbId,
    pub automation_type: String,
    pub epoch_key: String,
}

/// A successful claim: the record id and how many times it has been claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct ClaimedEffect {
    pub id: DbId,
    pub attempts: i32,
}
