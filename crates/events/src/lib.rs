//! Automation event envelope and submission queue.
//!
//! Request handlers never run automation inline. They submit an
//! [`AutomationEvent`] to the [`EventQueue`] and return; a supervised worker
//! in `cadence-automation` drains the queue.
//!
//! - [`AutomationEvent`]: the business events that can trigger automation.
//! - [`EventEnvelope`]: an event plus submission id and timestamp.
//! - [`EventQueue`]: bounded, non-blocking submission handle.

pub mod event;
pub mod queue;

pub use event::{AutomationEvent, EventEnvelope};
pub use queue::{EventQueue, EventReceiver, SubmitError};
