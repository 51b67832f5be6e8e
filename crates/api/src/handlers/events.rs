//! Handler for event-triggered automation.
//!
//! Customer-scoped events are queued and handled by the background worker so
//! the caller never waits on the gateway. Business-scoped checks run inline
//! and report how many customers they processed.

use axum::extract::State;
use axum::Json;
use cadence_core::error::CoreError;
use cadence_core::types::DbId;
use cadence_events::AutomationEvent;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::CronAuth;
use crate::state::AppState;

/// Request body for `POST /automation-events`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEventRequest {
    pub event_type: String,
    pub business_id: DbId,
    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub customer_id: Option<DbId>,
    pub load_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct TriggerEventResponse {
    pub status: &'static str,
    pub event: String,
    pub processed: i32,
}

fn require(value: Option<DbId>, field: &str) -> AppResult<DbId> {
    value.ok_or_else(|| AppError::BadRequest(format!("data.{field} is required")))
}

/// Resolve the request into a typed event, checking that referenced
/// records exist and belong to the business.
async fn resolve_event(state: &AppState, input: &TriggerEventRequest) -> AppResult<AutomationEvent> {
    let business_id = input.business_id;
    match input.event_type.as_str() {
        "customer_registered" => {
            let customer_id = require(input.data.customer_id, "customerId")?;
            match state.store.customer(customer_id).await? {
                Some(c) if c.business_id == business_id => {}
                _ => {
                    return Err(AppError::Core(CoreError::NotFound {
                        entity: "Customer",
                        id: customer_id,
                    }))
                }
            }
            Ok(AutomationEvent::CustomerRegistered {
                business_id,
                customer_id,
            })
        }
        "points_loaded" => {
            let customer_id = require(input.data.customer_id, "customerId")?;
            let load_id = require(input.data.load_id, "loadId")?;
            let load = state
                .store
                .point_load(load_id)
                .await?
                .filter(|l| l.customer_id == customer_id && l.business_id == business_id)
                .ok_or_else(|| AppError::Core(CoreError::NotFound {
                    entity: "PointLoad",
                    id: load_id,
                }))?;
            Ok(AutomationEvent::PointsLoaded {
                business_id,
                customer_id,
                load_id,
                points_added: load.points,
            })
        }
        "birthday_check" => Ok(AutomationEvent::BirthdayCheck { business_id }),
        "inactive_check" => Ok(AutomationEvent::InactiveCheck { business_id }),
        other => Err(AppError::BadRequest(format!("Unknown event type: '{other}'"))),
    }
}

/// POST /automation-events
pub async fn trigger_event(
    _auth: CronAuth,
    State(state): State<AppState>,
    Json(input): Json<TriggerEventRequest>,
) -> AppResult<Json<TriggerEventResponse>> {
    let event = resolve_event(&state, &input).await?;

    if event.customer_id().is_some() {
        let envelope_id = state.queue.submit(event)?;
        tracing::info!(
            %envelope_id,
            event_type = %input.event_type,
            business_id = input.business_id,
            "Automation event accepted",
        );
        return Ok(Json(TriggerEventResponse {
            status: "queued",
            event: input.event_type,
            processed: 0,
        }));
    }

    let result = state.engine.handle_event(&event).await?;
    Ok(Json(TriggerEventResponse {
        status: "completed",
        event: input.event_type,
        processed: result.counters.customers_processed,
    }))
}
