//! Automation rule model.

use cadence_core::automation::AutomationType;
use cadence_core::error::CoreError;
use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `automations` table. Read-only to the engine.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AutomationRule {
    pub id: DbId,
    pub business_id: DbId,
    pub automation_type: String,
    /// Days before the event (birthday reminders) or inactivity threshold
    /// in days (inactive). Zero means the default behaviour.
    pub trigger_offset: i32,
    pub is_active: bool,
    /// Name of the provider-side message template. Empty when unset.
    pub message_template: String,
    pub promotion_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl AutomationRule {
    pub fn kind(&self) -> Result<AutomationType, CoreError> {
        self.automation_type.parse()
    }

    pub fn has_template(&self) -> bool {
        !self.message_template.trim().is_empty()
    }
}
