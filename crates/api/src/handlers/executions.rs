use axum::extract::{Query, State};
use axum::Json;
use cadence_db::models::execution_log::ExecutionLog;

use crate::error::AppResult;
use crate::middleware::auth::CronAuth;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /automation-executions?limit=&offset=
///
/// Execution log rows, newest first.
pub async fn list_executions(
    _auth: CronAuth,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ExecutionLog>>>> {
    let data = state
        .store
        .recent_execution_logs(params.limit(), params.offset())
        .await?;
    Ok(Json(DataResponse { data }))
}
