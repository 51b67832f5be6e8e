//! Single-attempt message dispatch.
//!
//! Each send is bounded by a timeout and tried exactly once. A failure is
//! written to the claimed effect record as `failed`, which the next sweep
//! may re-claim.

use std::sync::Arc;
use std::time::Duration;

use cadence_core::automation::EffectStatus;
use cadence_db::models::automation_log::ClaimedEffect;
use cadence_messaging::{GatewayError, MessagingGateway, TemplateMessage};
use serde_json::json;

use crate::claims::ClaimTracker;
use crate::composer::ComposedMessage;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Gateway call timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { message_id: String },
    Failed { error: String },
}

pub struct Dispatcher {
    gateway: Arc<dyn MessagingGateway>,
    tracker: ClaimTracker,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn MessagingGateway>, tracker: ClaimTracker, timeout: Duration) -> Self {
        Self {
            gateway,
            tracker,
            timeout,
        }
    }

    /// One bounded gateway call.
    pub async fn dispatch(&self, message: &TemplateMessage) -> Result<String, DispatchError> {
        match tokio::time::timeout(self.timeout, self.gateway.send_template(message)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        }
    }

    /// Send a composed message for a claimed effect and record the outcome.
    ///
    /// `detail` is merged into the stored record alongside the message id or
    /// error. A failure to record is logged; the delivery outcome stands.
    pub async fn deliver(
        &self,
        claim: &ClaimedEffect,
        message: &ComposedMessage,
        phone: &str,
        mut detail: serde_json::Value,
    ) -> DeliveryOutcome {
        let template = message.to_template(phone);
        let (status, outcome) = match self.dispatch(&template).await {
            Ok(message_id) => {
                detail["message_id"] = json!(message_id);
                (EffectStatus::Sent, DeliveryOutcome::Sent { message_id })
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(effect_id = claim.id, attempts = claim.attempts, error = %error, "Message dispatch failed");
                detail["error"] = json!(error);
                (EffectStatus::Failed, DeliveryOutcome::Failed { error })
            }
        };
        detail["attempts"] = json!(claim.attempts);

        if let Err(e) = self.tracker.record(claim, status, &detail).await {
            tracing::error!(effect_id = claim.id, status = status.as_str(), error = %e, "Failed to record effect outcome");
        }
        outcome
    }
}
