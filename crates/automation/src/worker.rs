//! Supervised event worker.
//!
//! Drains the [`EventReceiver`] and handles each event in its own task, so
//! a failing or panicking event never takes down the worker or delays the
//! request that submitted it. On cancellation the worker stops accepting
//! new events, processes what is already buffered, and waits for in-flight
//! tasks.

use std::sync::Arc;

use cadence_events::{EventEnvelope, EventReceiver};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::coordinator::TriggerCoordinator;

pub struct EventWorker {
    coordinator: Arc<TriggerCoordinator>,
}

impl EventWorker {
    pub fn new(coordinator: Arc<TriggerCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Run until `cancel` fires or every queue sender is dropped.
    pub async fn run(self, mut receiver: EventReceiver, cancel: CancellationToken) {
        tracing::info!("Automation event worker started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = receiver.recv() => match maybe {
                    Some(envelope) => self.spawn(&mut tasks, envelope),
                    None => break,
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    log_join(joined);
                }
            }
        }

        receiver.close();
        while let Some(envelope) = receiver.recv().await {
            self.spawn(&mut tasks, envelope);
        }
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }
        tracing::info!("Automation event worker stopped");
    }

    fn spawn(&self, tasks: &mut JoinSet<()>, envelope: EventEnvelope) {
        let coordinator = Arc::clone(&self.coordinator);
        tasks.spawn(async move {
            let event_type = envelope.event.event_type();
            match coordinator.handle_event(&envelope.event).await {
                Ok(result) => tracing::debug!(
                    envelope_id = %envelope.id,
                    event_type,
                    run_id = %result.run_id,
                    sent = result.counters.messages_sent,
                    "Automation event handled",
                ),
                Err(e) => tracing::error!(
                    envelope_id = %envelope.id,
                    event_type,
                    error = %e,
                    "Automation event failed",
                ),
            }
        });
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(error = %e, "Automation event task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cadence_core::automation::AutomationType;
    use cadence_events::{AutomationEvent, EventQueue};
    use cadence_messaging::DryRunGateway;
    use chrono::Datelike;

    use super::*;
    use crate::config::EngineConfig;
    use crate::fixtures::{business, customer, rule};
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn buffered_events_are_drained_on_shutdown() {
        let store = Arc::new(MemoryStore::new());
        store.insert_business(business(1));
        store.insert_rule(rule(100, 1, AutomationType::MissingFields, "complete_profile"));
        for id in [10, 11] {
            let mut c = customer(id, 1);
            c.email = None;
            store.insert_customer(c);
        }
        let coordinator = Arc::new(TriggerCoordinator::new(
            store.clone(),
            Arc::new(DryRunGateway),
            EngineConfig::default(),
        ));

        let (queue, receiver) = EventQueue::new(8);
        for customer_id in [10, 11, 999] {
            queue
                .submit(AutomationEvent::CustomerRegistered {
                    business_id: 1,
                    customer_id,
                })
                .unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(
            Duration::from_secs(5),
            EventWorker::new(coordinator).run(receiver, cancel),
        )
        .await
        .unwrap();

        let sent: Vec<_> = store
            .effects()
            .into_iter()
            .filter(|e| e.status == "sent")
            .collect();
        assert_eq!(sent.len(), 2);
        // 999 is unknown: its run ends in an error row, not a worker crash.
        assert!(store.execution_logs().iter().any(|l| l.status == "error"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn check_events_run_on_multi_thread_runtime() {
        let store = Arc::new(MemoryStore::new());
        store.insert_business(business(1));
        store.insert_rule(rule(100, 1, AutomationType::Birthday, "happy_birthday"));
        let today = chrono::Utc::now().date_naive();
        for id in [10, 11] {
            let mut c = customer(id, 1);
            c.birthday = today.with_year(1992);
            store.insert_customer(c);
        }
        let coordinator = Arc::new(TriggerCoordinator::new(
            store.clone(),
            Arc::new(DryRunGateway),
            EngineConfig::default(),
        ));

        let (queue, receiver) = EventQueue::new(8);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(EventWorker::new(coordinator).run(receiver, cancel.clone()));
        queue
            .submit(AutomationEvent::BirthdayCheck { business_id: 1 })
            .unwrap();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .unwrap()
            .unwrap();

        let sent = store
            .effects()
            .into_iter()
            .filter(|e| e.automation_type == "birthday" && e.status == "sent")
            .count();
        assert_eq!(sent, 2);
        assert!(store
            .execution_logs()
            .iter()
            .any(|l| l.event_type == "sweep.birthday" && l.status == "completed"));
    }

    #[tokio::test]
    async fn worker_stops_when_queue_closes() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = Arc::new(TriggerCoordinator::new(
            store,
            Arc::new(DryRunGateway),
            EngineConfig::default(),
        ));
        let (queue, receiver) = EventQueue::new(8);
        drop(queue);

        tokio::time::timeout(
            Duration::from_secs(5),
            EventWorker::new(coordinator).run(receiver, CancellationToken::new()),
        )
        .await
        .unwrap();
    }
}
