use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Automation routes.
///
/// ```text
/// GET, POST /automations/{family}        run_family
/// POST      /automation-events           trigger_event
/// GET       /automation-executions       list_executions
/// POST      /customers/{id}/point-loads  create_point_load
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/automations/{family}",
            get(handlers::automations::run_family).post(handlers::automations::run_family),
        )
        .route(
            "/automation-events",
            post(handlers::events::trigger_event),
        )
        .route(
            "/automation-executions",
            get(handlers::executions::list_executions),
        )
        .route(
            "/customers/{id}/point-loads",
            post(handlers::point_loads::create_point_load),
        )
}
