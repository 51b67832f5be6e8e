use std::sync::Arc;

use cadence_automation::{AutomationStore, TriggerCoordinator};
use cadence_events::EventQueue;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is an `Arc` or a cloneable handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (health checks).
    pub pool: cadence_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Datastore used by handlers and the engine.
    pub store: Arc<dyn AutomationStore>,
    /// Runs sweeps and business-scoped checks synchronously.
    pub engine: Arc<TriggerCoordinator>,
    /// Submission handle for customer-scoped events.
    pub queue: EventQueue,
}
