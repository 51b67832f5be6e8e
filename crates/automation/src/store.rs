//! Datastore seam for the engine.
//!
//! [`AutomationStore`] is every read and write the engine performs.
//! [`PgStore`] delegates to the `cadence-db` repositories; the in-memory
//! [`MemoryStore`](crate::memory::MemoryStore) mirrors the same claim
//! semantics for tests (`test-support` feature).

use async_trait::async_trait;
use cadence_core::automation::{AutomationType, EffectStatus};
use cadence_core::types::{DbId, Timestamp};
use cadence_db::models::automation::AutomationRule;
use cadence_db::models::automation_log::{AutomationLog, ClaimedEffect, EffectKey};
use cadence_db::models::business::Business;
use cadence_db::models::customer::Customer;
use cadence_db::models::execution_log::{CreateExecutionLog, ExecutionLog};
use cadence_db::models::point_load::{CreatePointLoad, PointLoad};
use cadence_db::models::promotion::Promotion;
use cadence_db::models::redeemable_item::RedeemableItem;
use cadence_db::repositories::{
    AutomationLogRepo, AutomationRepo, BusinessRepo, CustomerRepo, ExecutionLogRepo,
    PointLoadRepo, PromotionRepo, RedeemableItemRepo,
};
use cadence_db::DbPool;

use crate::error::StoreError;

#[async_trait]
pub trait AutomationStore: Send + Sync {
    // ---- Businesses and rules ----

    /// Businesses with at least one active rule of the given types.
    async fn business_ids_with_active_rules(
        &self,
        types: &[AutomationType],
    ) -> Result<Vec<DbId>, StoreError>;

    async fn business(&self, id: DbId) -> Result<Option<Business>, StoreError>;

    /// Active rules of the given types for a business, ordered by id.
    async fn active_rules(
        &self,
        business_id: DbId,
        types: &[AutomationType],
    ) -> Result<Vec<AutomationRule>, StoreError>;

    // ---- Customers ----

    async fn customers(&self, business_id: DbId) -> Result<Vec<Customer>, StoreError>;

    async fn customer(&self, id: DbId) -> Result<Option<Customer>, StoreError>;

    /// Add a tag unless present. Returns `true` if the customer changed.
    async fn add_tag(&self, customer_id: DbId, tag: &str) -> Result<bool, StoreError>;

    // ---- Catalog ----

    /// Cheapest active item the customer has not yet passed.
    async fn next_reward(
        &self,
        business_id: DbId,
        points: i32,
    ) -> Result<Option<RedeemableItem>, StoreError>;

    async fn promotion(&self, id: DbId) -> Result<Option<Promotion>, StoreError>;

    // ---- Point loads ----

    /// Record a point load and bump the customer's counters. `None` when the
    /// customer does not exist.
    async fn create_point_load(
        &self,
        input: &CreatePointLoad,
    ) -> Result<Option<PointLoad>, StoreError>;

    async fn point_load(&self, id: DbId) -> Result<Option<PointLoad>, StoreError>;

    /// Loads created since `since` for businesses with an active points
    /// notification rule that have no points-notification record yet.
    async fn unnotified_point_loads(
        &self,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<PointLoad>, StoreError>;

    // ---- Effect records ----

    /// Claim an effect identity. `None` when it is already pending, sent or
    /// skipped.
    async fn try_claim(&self, key: &EffectKey) -> Result<Option<ClaimedEffect>, StoreError>;

    async fn record_outcome(
        &self,
        id: DbId,
        status: EffectStatus,
        detail: &serde_json::Value,
    ) -> Result<(), StoreError>;

    async fn find_effect(&self, key: &EffectKey) -> Result<Option<AutomationLog>, StoreError>;

    /// Failed records of one type first claimed at or after `since`.
    async fn failed_effects_since(
        &self,
        automation_type: AutomationType,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<AutomationLog>, StoreError>;

    // ---- Execution log ----

    async fn append_execution_log(&self, entry: &CreateExecutionLog) -> Result<DbId, StoreError>;

    async fn recent_execution_logs(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExecutionLog>, StoreError>;
}

fn type_names(types: &[AutomationType]) -> Vec<String> {
    types.iter().map(|t| t.as_str().to_string()).collect()
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AutomationStore for PgStore {
    async fn business_ids_with_active_rules(
        &self,
        types: &[AutomationType],
    ) -> Result<Vec<DbId>, StoreError> {
        Ok(BusinessRepo::list_ids_with_active_rules(&self.pool, &type_names(types)).await?)
    }

    async fn business(&self, id: DbId) -> Result<Option<Business>, StoreError> {
        Ok(BusinessRepo::find_by_id(&self.pool, id).await?)
    }

    async fn active_rules(
        &self,
        business_id: DbId,
        types: &[AutomationType],
    ) -> Result<Vec<AutomationRule>, StoreError> {
        Ok(
            AutomationRepo::list_active_for_business(&self.pool, business_id, &type_names(types))
                .await?,
        )
    }

    async fn customers(&self, business_id: DbId) -> Result<Vec<Customer>, StoreError> {
        Ok(CustomerRepo::list_for_business(&self.pool, business_id).await?)
    }

    async fn customer(&self, id: DbId) -> Result<Option<Customer>, StoreError> {
        Ok(CustomerRepo::find_by_id(&self.pool, id).await?)
    }

    async fn add_tag(&self, customer_id: DbId, tag: &str) -> Result<bool, StoreError> {
        Ok(CustomerRepo::add_tag(&self.pool, customer_id, tag).await?)
    }

    async fn next_reward(
        &self,
        business_id: DbId,
        points: i32,
    ) -> Result<Option<RedeemableItem>, StoreError> {
        Ok(RedeemableItemRepo::next_reward(&self.pool, business_id, points).await?)
    }

    async fn promotion(&self, id: DbId) -> Result<Option<Promotion>, StoreError> {
        Ok(PromotionRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_point_load(
        &self,
        input: &CreatePointLoad,
    ) -> Result<Option<PointLoad>, StoreError> {
        Ok(PointLoadRepo::create(&self.pool, input).await?)
    }

    async fn point_load(&self, id: DbId) -> Result<Option<PointLoad>, StoreError> {
        Ok(PointLoadRepo::find_by_id(&self.pool, id).await?)
    }

    async fn unnotified_point_loads(
        &self,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<PointLoad>, StoreError> {
        Ok(PointLoadRepo::list_unnotified_since(&self.pool, business_id, since).await?)
    }

    async fn try_claim(&self, key: &EffectKey) -> Result<Option<ClaimedEffect>, StoreError> {
        Ok(AutomationLogRepo::try_claim(&self.pool, key).await?)
    }

    async fn record_outcome(
        &self,
        id: DbId,
        status: EffectStatus,
        detail: &serde_json::Value,
    ) -> Result<(), StoreError> {
        Ok(AutomationLogRepo::record_outcome(&self.pool, id, status, detail).await?)
    }

    async fn find_effect(&self, key: &EffectKey) -> Result<Option<AutomationLog>, StoreError> {
        Ok(AutomationLogRepo::find_by_key(&self.pool, key).await?)
    }

    async fn failed_effects_since(
        &self,
        automation_type: AutomationType,
        business_id: Option<DbId>,
        since: Timestamp,
    ) -> Result<Vec<AutomationLog>, StoreError> {
        Ok(AutomationLogRepo::list_failed_since(
            &self.pool,
            automation_type.as_str(),
            business_id,
            since,
        )
        .await?)
    }

    async fn append_execution_log(&self, entry: &CreateExecutionLog) -> Result<DbId, StoreError> {
        Ok(ExecutionLogRepo::insert(&self.pool, entry).await?)
    }

    async fn recent_execution_logs(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExecutionLog>, StoreError> {
        Ok(ExecutionLogRepo::list_recent(&self.pool, limit, offset).await?)
    }
}
