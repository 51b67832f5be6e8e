pub mod automations;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the authenticated route tree.
///
/// Route hierarchy:
///
/// ```text
/// /automations/{family}                  run a sweep family or run-all (GET, POST)
/// /automation-events                     trigger automation for a business event (POST)
/// /automation-executions                 execution log, newest first (GET)
/// /customers/{id}/point-loads            load points onto a customer (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    automations::router()
}
