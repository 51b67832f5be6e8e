//! Handler for loading points onto a customer.
//!
//! The load is written and acknowledged first; the `points_loaded`
//! automation runs afterwards on the event worker.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cadence_core::error::CoreError;
use cadence_core::types::DbId;
use cadence_db::models::point_load::{CreatePointLoad, PointLoad};
use cadence_events::AutomationEvent;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::CronAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /customers/{id}/point-loads`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePointLoadRequest {
    #[validate(range(min = 1))]
    pub points: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub amount_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct PointLoadAccepted {
    pub load: PointLoad,
    /// `false` when the automation queue refused the event. The load is still
    /// recorded and the next points sweep notifies it.
    pub automation_queued: bool,
}

/// POST /customers/{id}/point-loads
pub async fn create_point_load(
    _auth: CronAuth,
    State(state): State<AppState>,
    Path(customer_id): Path<DbId>,
    Json(input): Json<CreatePointLoadRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<PointLoadAccepted>>)> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let load = state
        .store
        .create_point_load(&CreatePointLoad {
            customer_id,
            points: input.points,
            amount_cents: input.amount_cents,
        })
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Customer",
                id: customer_id,
            })
        })?;

    let event = AutomationEvent::PointsLoaded {
        business_id: load.business_id,
        customer_id,
        load_id: load.id,
        points_added: load.points,
    };
    let automation_queued = match state.queue.submit(event) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                load_id = load.id,
                customer_id,
                error = %e,
                "Point load recorded but automation was not queued; points sweep will notify it",
            );
            false
        }
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: PointLoadAccepted {
                load,
                automation_queued,
            },
        }),
    ))
}
