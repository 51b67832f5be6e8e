//! Business events that trigger lifecycle automation.

use cadence_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AutomationEvent
// ---------------------------------------------------------------------------

/// An event raised by request-handling code that may trigger automation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AutomationEvent {
    /// A customer profile was created.
    CustomerRegistered { business_id: DbId, customer_id: DbId },

    /// Points were loaded onto a customer by the point-load operation `load_id`.
    PointsLoaded {
        business_id: DbId,
        customer_id: DbId,
        load_id: DbId,
        points_added: i32,
    },

    /// Business-scoped birthday sweep requested outside the schedule.
    BirthdayCheck { business_id: DbId },

    /// Business-scoped inactivity sweep requested outside the schedule.
    InactiveCheck { business_id: DbId },
}

impl AutomationEvent {
    /// Snake-case event name, also written to the execution log.
    pub fn event_type(&self) -> &'static str {
        match self {
            AutomationEvent::CustomerRegistered { .. } => "customer_registered",
            AutomationEvent::PointsLoaded { .. } => "points_loaded",
            AutomationEvent::BirthdayCheck { .. } => "birthday_check",
            AutomationEvent::InactiveCheck { .. } => "inactive_check",
        }
    }

    pub fn business_id(&self) -> DbId {
        match self {
            AutomationEvent::CustomerRegistered { business_id, .. }
            | AutomationEvent::PointsLoaded { business_id, .. }
            | AutomationEvent::BirthdayCheck { business_id }
            | AutomationEvent::InactiveCheck { business_id } => *business_id,
        }
    }

    /// The single customer the event concerns, for customer-scoped events.
    pub fn customer_id(&self) -> Option<DbId> {
        match self {
            AutomationEvent::CustomerRegistered { customer_id, .. }
            | AutomationEvent::PointsLoaded { customer_id, .. } => Some(*customer_id),
            AutomationEvent::BirthdayCheck { .. } | AutomationEvent::InactiveCheck { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// EventEnvelope
// ---------------------------------------------------------------------------

/// A submitted event with its submission id and time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub event: AutomationEvent,
    pub submitted_at: Timestamp,
}

impl EventEnvelope {
    pub fn new(event: AutomationEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            submitted_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_type_tag() {
        let event = AutomationEvent::PointsLoaded {
            business_id: 1,
            customer_id: 2,
            load_id: 3,
            points_added: 40,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "points_loaded");
        assert_eq!(json["load_id"], 3);
        assert_eq!(event.event_type(), "points_loaded");
    }

    #[test]
    fn customer_scope_only_for_customer_events() {
        let registered = AutomationEvent::CustomerRegistered {
            business_id: 9,
            customer_id: 4,
        };
        assert_eq!(registered.customer_id(), Some(4));
        assert_eq!(registered.business_id(), 9);

        let check = AutomationEvent::InactiveCheck { business_id: 9 };
        assert_eq!(check.customer_id(), None);
    }
}
