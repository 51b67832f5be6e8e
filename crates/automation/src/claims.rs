//! Effect-record claims.
//!
//! A claim must be won before any side effect. Losing a claim is not an
//! error: it means the effect already happened, is in flight elsewhere, or
//! was deliberately skipped.

use std::sync::Arc;

use cadence_core::automation::{AutomationType, EffectStatus};
use cadence_core::types::DbId;
use cadence_db::models::automation_log::{ClaimedEffect, EffectKey};

use crate::error::StoreError;
use crate::store::AutomationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(ClaimedEffect),
    AlreadyClaimed,
}

/// Build the identity of one effect.
pub fn effect_key(
    business_id: DbId,
    customer_id: DbId,
    automation_type: AutomationType,
    epoch_key: &str,
) -> EffectKey {
    EffectKey {
        business_id,
        customer_id,
        automation_type: automation_type.as_str().to_string(),
        epoch_key: epoch_key.to_string(),
    }
}

/// Claims effect identities and records their outcomes.
#[derive(Clone)]
pub struct ClaimTracker {
    store: Arc<dyn AutomationStore>,
}

impl ClaimTracker {
    pub fn new(store: Arc<dyn AutomationStore>) -> Self {
        Self { store }
    }

    pub async fn try_claim(&self, key: &EffectKey) -> Result<ClaimOutcome, StoreError> {
        match self.store.try_claim(key).await? {
            Some(claim) => {
                if claim.attempts > 1 {
                    tracing::info!(
                        customer_id = key.customer_id,
                        automation_type = %key.automation_type,
                        epoch_key = %key.epoch_key,
                        attempts = claim.attempts,
                        "Re-claimed failed effect",
                    );
                }
                Ok(ClaimOutcome::Claimed(claim))
            }
            None => Ok(ClaimOutcome::AlreadyClaimed),
        }
    }

    pub async fn record(
        &self,
        claim: &ClaimedEffect,
        status: EffectStatus,
        detail: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.store.record_outcome(claim.id, status, detail).await
    }
}
