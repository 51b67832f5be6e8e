//! Customer lifecycle automation engine.
//!
//! Sweeps and business events both funnel through one pipeline:
//!
//! ```text
//! TriggerCoordinator -> evaluate -> MessageComposer -> ClaimTracker::try_claim
//!                    -> (VIP tag) -> Dispatcher -> ExecutionRecorder
//! ```
//!
//! The claim on an effect record is the only concurrency control; it is an
//! atomic insert-if-absent in the datastore, so overlapping sweeps, events
//! and process instances can never produce two sends for one epoch.

pub mod claims;
pub mod composer;
pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod eligibility;
pub mod error;
pub mod execution_log;
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod store;
pub mod worker;

pub use config::EngineConfig;
pub use coordinator::{SweepResult, TriggerCoordinator, TriggerKind};
pub use error::{EngineError, StoreError};
pub use store::{AutomationStore, PgStore};
pub use worker::EventWorker;
