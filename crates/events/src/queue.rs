//! Bounded, non-blocking event submission.
//!
//! [`EventQueue`] wraps a `tokio::sync::mpsc` sender. Submission never waits:
//! when the buffer is full the event is rejected with [`SubmitError::Full`]
//! so the request that raised it can still return promptly.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::{AutomationEvent, EventEnvelope};

/// Default buffer capacity of the queue.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Receiving half, drained by the automation worker.
pub type EventReceiver = mpsc::Receiver<EventEnvelope>;

/// Error type for event submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The queue buffer is full.
    #[error("Automation event queue is full")]
    Full,

    /// The worker has shut down.
    #[error("Automation event queue is closed")]
    Closed,
}

/// Cloneable submission handle shared across request handlers.
#[derive(Debug, Clone)]
pub struct EventQueue {
    sender: mpsc::Sender<EventEnvelope>,
}

impl EventQueue {
    /// Create a queue with the given capacity, returning the receiving half.
    pub fn new(capacity: usize) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Submit an event without waiting. Returns the envelope id.
    pub fn submit(&self, event: AutomationEvent) -> Result<Uuid, SubmitError> {
        let envelope = EventEnvelope::new(event);
        let id = envelope.id;
        let event_type = envelope.event.event_type();

        self.sender.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SubmitError::Full,
            mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
        })?;

        tracing::debug!(envelope_id = %id, event_type, "Automation event queued");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn registered(customer_id: i64) -> AutomationEvent {
        AutomationEvent::CustomerRegistered {
            business_id: 1,
            customer_id,
        }
    }

    #[tokio::test]
    async fn submitted_event_reaches_receiver() {
        let (queue, mut rx) = EventQueue::new(4);
        let id = queue.submit(registered(7)).unwrap();

        let envelope = rx.recv().await.expect("should receive the envelope");
        assert_eq!(envelope.id, id);
        assert_eq!(envelope.event, registered(7));
    }

    #[test]
    fn full_queue_rejects_without_blocking() {
        let (queue, _rx) = EventQueue::new(1);
        queue.submit(registered(1)).unwrap();
        assert_matches!(queue.submit(registered(2)), Err(SubmitError::Full));
    }

    #[test]
    fn dropped_receiver_closes_queue() {
        let (queue, rx) = EventQueue::new(4);
        drop(rx);
        assert_matches!(queue.submit(registered(1)), Err(SubmitError::Closed));
    }
}
