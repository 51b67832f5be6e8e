//! Append-only execution log.
//!
//! Every sweep or event handling writes a `started` row when it begins and
//! a terminal `completed` or `error` row when it ends, both carrying the
//! same `run_id`. Writing the log never fails the run it describes.

use std::sync::Arc;
use std::time::Instant;

use cadence_core::automation::ExecutionStatus;
use cadence_core::types::DbId;
use cadence_db::models::execution_log::CreateExecutionLog;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::store::AutomationStore;

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub customers_processed: i32,
    pub messages_sent: i32,
    pub vip_promotions: i32,
    pub skipped: i32,
    pub already_claimed: i32,
    pub errors_count: i32,
}

impl RunCounters {
    pub fn merge(&mut self, other: &RunCounters) {
        self.customers_processed += other.customers_processed;
        self.messages_sent += other.messages_sent;
        self.vip_promotions += other.vip_promotions;
        self.skipped += other.skipped;
        self.already_claimed += other.already_claimed;
        self.errors_count += other.errors_count;
    }
}

/// An in-progress run.
#[derive(Debug)]
pub struct RunHandle {
    pub run_id: Uuid,
    pub event_type: String,
    pub business_id: Option<DbId>,
    started: Instant,
}

impl RunHandle {
    pub fn elapsed_ms(&self) -> i64 {
        i64::try_from(self.started.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

#[derive(Clone)]
pub struct ExecutionRecorder {
    store: Arc<dyn AutomationStore>,
}

impl ExecutionRecorder {
    pub fn new(store: Arc<dyn AutomationStore>) -> Self {
        Self { store }
    }

    /// Write the `started` row and return a handle for the terminal row.
    pub async fn start(&self, event_type: impl Into<String>, business_id: Option<DbId>) -> RunHandle {
        let handle = RunHandle {
            run_id: Uuid::new_v4(),
            event_type: event_type.into(),
            business_id,
            started: Instant::now(),
        };
        self.append(&handle, ExecutionStatus::Started, &RunCounters::default(), 0, json!({}))
            .await;
        handle
    }

    /// Write the `completed` row. Returns the run duration in milliseconds.
    pub async fn complete(
        &self,
        handle: &RunHandle,
        counters: &RunCounters,
        details: serde_json::Value,
    ) -> i64 {
        let elapsed = handle.elapsed_ms();
        self.append(handle, ExecutionStatus::Completed, counters, elapsed, details)
            .await;
        elapsed
    }

    /// Write the `error` row. Returns the run duration in milliseconds.
    pub async fn fail(&self, handle: &RunHandle, counters: &RunCounters, error: &str) -> i64 {
        let elapsed = handle.elapsed_ms();
        self.append(
            handle,
            ExecutionStatus::Error,
            counters,
            elapsed,
            json!({ "error": error }),
        )
        .await;
        elapsed
    }

    async fn append(
        &self,
        handle: &RunHandle,
        status: ExecutionStatus,
        counters: &RunCounters,
        execution_time_ms: i64,
        mut details: serde_json::Value,
    ) {
        if status != ExecutionStatus::Started {
            details["vip_promotions"] = json!(counters.vip_promotions);
            details["skipped"] = json!(counters.skipped);
            details["already_claimed"] = json!(counters.already_claimed);
        }
        let entry = CreateExecutionLog {
            run_id: handle.run_id,
            business_id: handle.business_id,
            event_type: handle.event_type.clone(),
            status: status.as_str().to_string(),
            customers_processed: counters.customers_processed,
            messages_sent: counters.messages_sent,
            errors_count: counters.errors_count,
            execution_time_ms,
            details,
        };
        if let Err(e) = self.store.append_execution_log(&entry).await {
            tracing::error!(
                run_id = %handle.run_id,
                event_type = %handle.event_type,
                status = status.as_str(),
                error = %e,
                "Failed to write execution log",
            );
        }
    }
}
