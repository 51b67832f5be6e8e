//! In-memory [`AutomationStore`] for tests.
//!
//! Claims follow the Postgres statement exactly: insert `pending`, re-claim
//! `failed` with `attempts + 1`, reject everything else. The whole state sits
//! behind one mutex, so a claim is atomic with respect to every other call.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cadence_core::automation::{AutomationType, EffectStatus};
use cadence_core::epoch::points_load_key;
use cadence_core::types::{DbId, Timestamp};
use cadence_db::models::automation::AutomationRule;
use cadence_db::models::automation_log::{AutomationLog, ClaimedEffect, EffectKey};
use cadence_db::models::business::Business;
use cadence_db::models::customer::Customer;
use cadence_db::models::execution_log::{CreateExecutionLog, ExecutionLog};
use cadence_db::models::point_load::{CreatePointLoad, PointLoad};
use cadence_db::models::promotion::Promotion;
use cadence_db::models::redeemable_item::RedeemableItem;
use chrono::Utc;

use crate::error::StoreError;
use crate::store::AutomationStore;

#[derive(Default)]
struct State {
    businesses: HashMap<DbId, Business>,
    customers: HashMap<DbId, Customer>,
    rules: Vec<AutomationRule>,
    items: Vec<RedeemableItem>,
    promotions: HashMap<DbId, Promotion>,
    point_loads: HashMap<DbId, PointLoad>,
    effects: HashMap<EffectKey, AutomationLog>,
    execution_logs: Vec<ExecutionLog>,
    next_id: DbId,
    failing_customers: HashSet<DbId>,
    failing_businesses: HashSet<DbId>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Mutex-guarded in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    // ---- Seeding ----

    pub fn insert_business(&self, business: Business) {
        self.with_state(|s| {
            s.next_id = s.next_id.max(business.id);
            s.businesses.insert(business.id, business);
        });
    }

    pub fn insert_customer(&self, customer: Customer) {
        self.with_state(|s| {
            s.next_id = s.next_id.max(customer.id);
            s.customers.insert(customer.id, customer);
        });
    }

    pub fn insert_rule(&self, rule: AutomationRule) {
        self.with_state(|s| {
            s.next_id = s.next_id.max(rule.id);
            s.rules.push(rule);
            s.rules.sort_by_key(|r| r.id);
        });
    }

    pub fn insert_item(&self, item: RedeemableItem) {
        self.with_state(|s| {
            s.next_id = s.next_id.max(item.id);
            s.items.push(item);
        });
    }

    pub fn insert_promotion(&self, promotion: Promotion) {
        self.with_state(|s| {
            s.next_id = s.next_id.max(promotion.id);
            s.promotions.insert(promotion.id, promotion);
        });
    }

    /// Seed an effect record as-is, timestamps included.
    pub fn insert_effect(&self, effect: AutomationLog) {
        self.with_state(|s| {
            s.next_id = s.next_id.max(effect.id);
            let key = EffectKey {
                business_id: effect.business_id,
                customer_id: effect.customer_id,
                automation_type: effect.automation_type.clone(),
                epoch_key: effect.epoch_key.clone(),
            };
            s.effects.insert(key, effect);
        });
    }

    /// Seed a point load without touching the customer's counters.
    pub fn insert_point_load(&self, load: PointLoad) {
        self.with_state(|s| {
            s.next_id = s.next_id.max(load.id);
            s.point_loads.insert(load.id, load);
        });
    }

    // ---- Fault injection ----

    /// Make claims and tag updates for this customer fail.
    pub fn fail_customer(&self, customer_id: DbId) {
        self.with_state(|s| {
            s.failing_customers.insert(customer_id);
        });
    }

    /// Make customer listing for this business fail.
    pub fn fail_business(&self, business_id: DbId) {
        self.with_state(|s| {
            s.failing_businesses.insert(business_id);
        });
    }

    // ---- Inspection ----

    pub fn effect(&self, key: &EffectKey) -> Option<AutomationLog> {
        self.with_state(|s| s.effects.get(key).cloned())
    }

    /// All effect records, ordered by id.
    pub fn effects(&self) -> Vec<AutomationLog> {
        self.with_state(|s| {
            let mut effects: Vec<_> = s.effects.values().cloned().collect();
            effects.sort_by_key(|e| e.id);
            effects
        })
    }

    /// All execution log rows in insertion order.
    pub fn execution_logs(&self) -> Vec<ExecutionLog> {
        self.with_state(|s| s.execution_logs.clone())
    }

    pub fn customer_snapshot(&self, id: DbId) -> Option<Customer> {
        self.with_state(|s| s.customers.get(&id).cloned())
    }
}

#[async_trait]
impl AutomationStore for MemoryStore {
    async fn business_ids_with_active_rules(
        &self,
        types: &[AutomationType],
    ) -> Result<Vec<DbId>, StoreError> {
        let state = self.lock()?;
        let mut ids: Vec<DbId> = state
            .rules
            .iter()
            .filter(|r| r.is_active && types.iter().any(|t| t.as_str() == r.automation_type))
            .map(|r| r.business_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn business(&self, id: DbId) -> Result<Option<Business>, StoreError> {
        Ok(self.lock()?.businesses.get(&id).cloned())
    }

    async fn active_rules(
        &self,
        business_id: DbId,
        types: &[AutomationType],
    ) -> Result<Vec<AutomationRule>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .rules
            .iter()
            .filter(|r| {
                r.business_id == business_id
                    && r.is_active
                    && types.iter().any(|t| t.as_str() == r.automation_type)
            })
            .cloned()
            .collect())
    }

    async fn customers(&self, business_id: DbId) -> Result<Vec<Customer>, StoreError> {
        let state = self.lock()?;
        if state.failing_businesses.contains(&business_id) {
            return Err(StoreError::Unavailable(format!(
                "customers of business {business_id}"
            )));
        }
        let mut customers: Vec<_> = state
            .customers
            .values()
            .filter(|c| c.business_id == business_id)
            .cloned()
            .collect();
        customers.sort_by_key(|c| c.id);
        Ok(customers)
    }

    async fn customer(&self, id: DbId) -> Result<Option<Customer>, StoreError> {
        Ok(self.lock()?.customers.get(&id).cloned())
    }

    async fn add_tag(&self, customer_id: DbId, tag: &str) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        if state.failing_customers.contains(&customer_id) {
            return Err(StoreError::Unavailable(format!("customer {customer_id}")));
        }
        let Some(customer) = state.customers.get_mut(&customer_id) else {
            return Ok(false);
        };
        if customer.has_tag(tag) {
            return Ok(false);
        }
        customer.tags.push(tag.to_string());
        customer.updated_at = Utc::now();
        Ok(true)
    }

    async fn next_reward(
        &self,
        business_id: DbId,
        points: i32,
    ) -> Result<Option<RedeemableItem>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .items
            .iter()
            .filter(|i| i.business_id == business_id && i.is_active && i.points_required >= points)
            .min_by_key(|i| (i.points_required, i.id))
            .cloned())
    }

    async fn promotion(&self, id: DbId) -> Result<Option<Promotion>, StoreError> {
        Ok(self.lock()?.promotions.get(&id).cloned())
    }

    async fn create_point_load(
        &self,
        input: &CreatePointLoad,
    ) -> Result<Option<PointLoad>, StoreError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let Some(customer) = state.customers.get_mut(&input.customer_id) else {
            return Ok(None);
        };
        customer.points += input.points;
        customer.total_spent_cents += input.amount_cents;
        customer.visit_count += 1;
        customer.last_interaction = now;
        customer.updated_at = now;
        let business_id = customer.business_id;

        let id = state.next_id();
        let load = PointLoad {
            id,
            business_id,
            customer_id: input.customer_id,
            points: input.points,
            amount_cents: input.amount_cents,
            created_at: now,
        };
        state.point_loads.insert(id, load.clone());
        Ok(Some(load))
    }

    async fn point_load(&self, id: DbId) -> Result<Option<PointLoad>, StoreError> {
        Ok(self.lock()?.point_loads.get(&id).cloned())
    }

    async fn unnotified_point_loads(
        &self,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<PointLoad>, StoreError> {
        let state = self.lock()?;
        let kind = AutomationType::PointsNotification.as_str();
        let notified = |load: &PointLoad| {
            let base = points_load_key(load.id);
            state.effects.keys().any(|k| {
                k.business_id == load.business_id
                    && k.customer_id == load.customer_id
                    && k.automation_type == kind
                    && k.epoch_key.split('/').next() == Some(base.as_str())
            })
        };
        let mut loads: Vec<_> = state
            .point_loads
            .values()
            .filter(|l| {
                l.created_at >= since
                    && business_id.map_or(true, |b| l.business_id == b)
                    && state.rules.iter().any(|r| {
                        r.business_id == l.business_id && r.is_active && r.automation_type == kind
                    })
                    && !notified(l)
            })
            .cloned()
            .collect();
        loads.sort_by_key(|l| (l.created_at, l.id));
        Ok(loads)
    }

    async fn try_claim(&self, key: &EffectKey) -> Result<Option<ClaimedEffect>, StoreError> {
        let mut state = self.lock()?;
        if state.failing_customers.contains(&key.customer_id) {
            return Err(StoreError::Unavailable(format!("customer {}", key.customer_id)));
        }
        let now = Utc::now();

        if let Some(existing) = state.effects.get_mut(key) {
            if existing.status != EffectStatus::Failed.as_str() {
                return Ok(None);
            }
            existing.status = EffectStatus::Pending.as_str().to_string();
            existing.attempts += 1;
            existing.updated_at = now;
            return Ok(Some(ClaimedEffect {
                id: existing.id,
                attempts: existing.attempts,
            }));
        }

        let id = state.next_id();
        state.effects.insert(
            key.clone(),
            AutomationLog {
                id,
                business_id: key.business_id,
                customer_id: key.customer_id,
                automation_type: key.automation_type.clone(),
                epoch_key: key.epoch_key.clone(),
                status: EffectStatus::Pending.as_str().to_string(),
                detail: serde_json::json!({}),
                attempts: 1,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(Some(ClaimedEffect { id, attempts: 1 }))
    }

    async fn record_outcome(
        &self,
        id: DbId,
        status: EffectStatus,
        detail: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if let Some(effect) = state.effects.values_mut().find(|e| e.id == id) {
            effect.status = status.as_str().to_string();
            effect.detail = detail.clone();
            effect.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_effect(&self, key: &EffectKey) -> Result<Option<AutomationLog>, StoreError> {
        Ok(self.lock()?.effects.get(key).cloned())
    }

    async fn failed_effects_since(
        &self,
        automation_type: AutomationType,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<AutomationLog>, StoreError> {
        let state = self.lock()?;
        let mut failed: Vec<_> = state
            .effects
            .values()
            .filter(|e| {
                e.automation_type == automation_type.as_str()
                    && e.status == EffectStatus::Failed.as_str()
                    && e.created_at >= since
                    && business_id.map_or(true, |b| e.business_id == b)
            })
            .cloned()
            .collect();
        failed.sort_by_key(|e| (e.created_at, e.id));
        Ok(failed)
    }

    async fn append_execution_log(&self, entry: &CreateExecutionLog) -> Result<DbId, StoreError> {
        let mut state = self.lock()?;
        let id = state.next_id();
        state.execution_logs.push(ExecutionLog {
            id,
            run_id: entry.run_id,
            business_id: entry.business_id,
            event_type: entry.event_type.clone(),
            status: entry.status.clone(),
            customers_processed: entry.customers_processed,
            messages_sent: entry.messages_sent,
            errors_count: entry.errors_count,
            execution_time_ms: entry.execution_time_ms,
            details: entry.details.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn recent_execution_logs(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExecutionLog>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .execution_logs
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{business, customer};

    fn key(customer_id: DbId) -> EffectKey {
        EffectKey {
            business_id: 1,
            customer_id,
            automation_type: "birthday".into(),
            epoch_key: "2025".into(),
        }
    }

    #[tokio::test]
    async fn pending_and_sent_block_reclaim() {
        let store = MemoryStore::new();
        let first = store.try_claim(&key(7)).await.unwrap().unwrap();
        assert!(store.try_claim(&key(7)).await.unwrap().is_none());

        store
            .record_outcome(first.id, EffectStatus::Sent, &serde_json::json!({}))
            .await
            .unwrap();
        assert!(store.try_claim(&key(7)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_is_reclaimed_with_attempt_count() {
        let store = MemoryStore::new();
        let first = store.try_claim(&key(7)).await.unwrap().unwrap();
        store
            .record_outcome(first.id, EffectStatus::Failed, &serde_json::json!({}))
            .await
            .unwrap();

        let retry = store.try_claim(&key(7)).await.unwrap().unwrap();
        assert_eq!(retry.id, first.id);
        assert_eq!(retry.attempts, 2);
    }

    #[tokio::test]
    async fn point_load_bumps_counters() {
        let store = MemoryStore::new();
        store.insert_business(business(1));
        store.insert_customer(customer(10, 1));

        let load = store
            .create_point_load(&CreatePointLoad {
                customer_id: 10,
                points: 30,
                amount_cents: 4_500,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(load.business_id, 1);

        let c = store.customer_snapshot(10).unwrap();
        assert_eq!(c.points, 30);
        assert_eq!(c.total_spent_cents, 4_500);
        assert_eq!(c.visit_count, 1);
        assert!(store.point_load(load.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn execution_logs_list_newest_first() {
        let store = MemoryStore::new();
        for event_type in ["sweep.birthday", "sweep.vip", "sweep.inactive"] {
            store
                .append_execution_log(&CreateExecutionLog {
                    run_id: uuid::Uuid::new_v4(),
                    business_id: None,
                    event_type: event_type.into(),
                    status: "completed".into(),
                    customers_processed: 0,
                    messages_sent: 0,
                    errors_count: 0,
                    execution_time_ms: 0,
                    details: serde_json::json!({}),
                })
                .await
                .unwrap();
        }
        let page = store.recent_execution_logs(2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].event_type, "sweep.inactive");
        assert_eq!(page[1].event_type, "sweep.vip");
    }
}
