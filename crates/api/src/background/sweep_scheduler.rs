//! In-process sweep scheduler.
//!
//! Deployments without an external cron can enable this to run every sweep
//! family (`run-all`) on a fixed period. The first run happens one period
//! after startup.

use std::sync::Arc;
use std::time::Duration;

use cadence_automation::TriggerCoordinator;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Run the scheduler loop until `cancel` is triggered.
///
/// A sweep in progress when cancellation fires is finished, not aborted.
pub async fn run(engine: Arc<TriggerCoordinator>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Sweep scheduler started");

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Sweep scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                for (family, outcome) in engine.run_all(None).await {
                    match outcome {
                        Ok(result) => tracing::info!(
                            family = family.as_str(),
                            run_id = %result.run_id,
                            customers_processed = result.counters.customers_processed,
                            messages_sent = result.counters.messages_sent,
                            errors_count = result.counters.errors_count,
                            "Scheduled sweep finished",
                        ),
                        Err(e) => tracing::error!(
                            family = family.as_str(),
                            error = %e,
                            "Scheduled sweep failed",
                        ),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cadence_automation::memory::MemoryStore;
    use cadence_automation::EngineConfig;
    use cadence_core::automation::SweepFamily;
    use cadence_messaging::DryRunGateway;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn runs_every_family_each_period() {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(TriggerCoordinator::new(
            store.clone(),
            Arc::new(DryRunGateway),
            EngineConfig::default(),
        ));
        let cancel = CancellationToken::new();
        let period = Duration::from_secs(60);
        let task = tokio::spawn(run(engine, period, cancel.clone()));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(store.execution_logs().is_empty());

        tokio::time::sleep(Duration::from_secs(45)).await;
        cancel.cancel();
        task.await.unwrap();

        let logs = store.execution_logs();
        for family in SweepFamily::RUN_ALL {
            let event_type = family.log_event_type();
            assert!(
                logs.iter()
                    .any(|l| l.event_type == event_type && l.status == "completed"),
                "missing completed run for {event_type}",
            );
        }
    }
}
