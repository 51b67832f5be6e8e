//! Handlers for the scheduler-facing sweep endpoint.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::Json;
use cadence_automation::execution_log::RunCounters;
use cadence_automation::SweepResult;
use cadence_core::automation::SweepFamily;
use cadence_core::types::Timestamp;
use chrono::Utc;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::CronAuth;
use crate::query::SweepScopeParams;
use crate::state::AppState;

/// Path segment that runs every family in order.
pub const RUN_ALL: &str = "run-all";

/// Per-family entry in a sweep response.
#[derive(Debug, Serialize)]
pub struct FamilyResult {
    pub family: SweepFamily,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SweepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for `/automations/{family}`.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    pub message: String,
    pub duration_ms: i64,
    pub timestamp: Timestamp,
    /// Counters merged across every family that ran.
    pub totals: RunCounters,
    pub results: Vec<FamilyResult>,
}

#[derive(Debug)]
enum Target {
    One(SweepFamily),
    All,
}

fn parse_target(family: &str) -> AppResult<Target> {
    if family == RUN_ALL {
        return Ok(Target::All);
    }
    SweepFamily::from_str(family)
        .map(Target::One)
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// GET|POST /automations/{family}?business_id=
///
/// A single family that fails as a whole returns the mapped error status.
/// For `run-all` every family runs; failures are reported per family with
/// `success: false` at the top level.
pub async fn run_family(
    _auth: CronAuth,
    State(state): State<AppState>,
    Path(family): Path<String>,
    Query(params): Query<SweepScopeParams>,
) -> AppResult<Json<SweepResponse>> {
    let target = parse_target(&family)?;
    let started = std::time::Instant::now();

    let results: Vec<FamilyResult> = match target {
        Target::One(f) => {
            let result = state.engine.run_sweep(f, params.business_id).await?;
            vec![FamilyResult {
                family: f,
                success: true,
                result: Some(result),
                error: None,
            }]
        }
        Target::All => state
            .engine
            .run_all(params.business_id)
            .await
            .into_iter()
            .map(|(f, outcome)| match outcome {
                Ok(result) => FamilyResult {
                    family: f,
                    success: true,
                    result: Some(result),
                    error: None,
                },
                Err(e) => {
                    tracing::error!(family = f.as_str(), error = %e, "Sweep family failed");
                    FamilyResult {
                        family: f,
                        success: false,
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect(),
    };

    let mut totals = RunCounters::default();
    for result in results.iter().filter_map(|r| r.result.as_ref()) {
        totals.merge(&result.counters);
    }
    let success = results.iter().all(|r| r.success);
    let message = if success {
        format!(
            "{family} completed: {} customers processed, {} messages sent",
            totals.customers_processed, totals.messages_sent
        )
    } else {
        format!("{family} completed with failures")
    };

    Ok(Json(SweepResponse {
        success,
        message,
        duration_ms: i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX),
        timestamp: Utc::now(),
        totals,
        results,
    }))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_families_and_run_all() {
        assert_matches!(parse_target("run-all"), Ok(Target::All));
        assert_matches!(
            parse_target("missing-fields"),
            Ok(Target::One(SweepFamily::MissingFields))
        );
        assert_matches!(parse_target("weekly"), Err(AppError::BadRequest(_)));
    }
}
