//! Sweep and event orchestration.
//!
//! [`TriggerCoordinator`] turns a sweep request or a business event into
//! per-customer pipelines:
//!
//! 1. evaluate eligibility (pure)
//! 2. compose the message, before anything is claimed
//! 3. claim the effect record; losing the claim ends the pipeline
//! 4. for VIP evaluation, tag the customer
//! 5. dispatch once and record `sent`/`failed`, or record `skipped`
//!
//! Customers are processed concurrently up to `sweep_concurrency`. A failure
//! while processing one customer is counted and logged; it never stops the
//! others.

use std::collections::HashMap;
use std::sync::Arc;

use cadence_core::automation::{AutomationType, EffectStatus, SweepFamily, VIP_TAG};
use cadence_core::epoch::{parse_points_load_key, VIP_EPOCH_KEY};
use cadence_core::types::{DbId, Timestamp};
use cadence_db::models::automation::AutomationRule;
use cadence_db::models::automation_log::AutomationLog;
use cadence_db::models::business::Business;
use cadence_db::models::customer::Customer;
use cadence_db::models::point_load::PointLoad;
use cadence_events::AutomationEvent;
use cadence_messaging::MessagingGateway;
use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::claims::{effect_key, ClaimOutcome, ClaimTracker};
use crate::composer::{ComposeError, MessageComposer};
use crate::config::EngineConfig;
use crate::dispatcher::{DeliveryOutcome, Dispatcher};
use crate::eligibility::{evaluate, Eligibility, EvaluationContext, IneligibleReason};
use crate::error::{EngineError, StoreError};
use crate::execution_log::{ExecutionRecorder, RunCounters, RunHandle};
use crate::store::AutomationStore;

pub use crate::eligibility::TriggerKind;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Summary of one sweep or event invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub run_id: Uuid,
    pub event_type: String,
    pub business_id: Option<DbId>,
    #[serde(flatten)]
    pub counters: RunCounters,
    pub duration_ms: i64,
}

/// What happened for one (customer, rule) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Ineligible(IneligibleReason),
    /// Composition failed; nothing was claimed.
    ComposeFailed(String),
    AlreadyClaimed,
    Delivered(DeliveryOutcome),
    Skipped,
}

/// Automation types an event may trigger, in processing order.
pub fn event_automation_types(event: &AutomationEvent) -> &'static [AutomationType] {
    match event {
        AutomationEvent::CustomerRegistered { .. } => {
            &[AutomationType::MissingFields, AutomationType::Birthday]
        }
        AutomationEvent::PointsLoaded { .. } => {
            &[AutomationType::PointsNotification, AutomationType::VipEvaluation]
        }
        AutomationEvent::BirthdayCheck { .. } => &[AutomationType::Birthday],
        AutomationEvent::InactiveCheck { .. } => &[AutomationType::Inactive],
    }
}

/// A business and the rules applicable to one trigger.
struct BusinessScope {
    business: Business,
    rules: Vec<(AutomationRule, AutomationType)>,
}

/// Parse rule types, order them by `types` and keep the first rule per
/// `(type, trigger_offset)`.
fn applicable_rules(
    rules: Vec<AutomationRule>,
    types: &[AutomationType],
) -> Vec<(AutomationRule, AutomationType)> {
    let mut parsed: Vec<(AutomationRule, AutomationType)> = rules
        .into_iter()
        .filter_map(|rule| match rule.kind() {
            Ok(kind) if types.contains(&kind) => Some((rule, kind)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(rule_id = rule.id, error = %e, "Skipping rule with unknown type");
                None
            }
        })
        .collect();
    parsed.sort_by_key(|(rule, kind)| (types.iter().position(|t| t == kind), rule.id));

    let mut seen = Vec::new();
    parsed.retain(|(rule, kind)| {
        let identity = (*kind, rule.trigger_offset);
        if seen.contains(&identity) {
            tracing::debug!(rule_id = rule.id, "Ignoring duplicate rule");
            false
        } else {
            seen.push(identity);
            true
        }
    });
    parsed
}

/// `promoted` is true when the outcome belongs to a VIP evaluation that
/// tagged the customer in this run.
fn tally(counters: &mut RunCounters, promoted: bool, outcome: &RuleOutcome) {
    match outcome {
        RuleOutcome::Ineligible(_) => {}
        RuleOutcome::AlreadyClaimed => counters.already_claimed += 1,
        RuleOutcome::ComposeFailed(_) => counters.errors_count += 1,
        RuleOutcome::Skipped => {
            counters.skipped += 1;
            counters.vip_promotions += i32::from(promoted);
        }
        RuleOutcome::Delivered(DeliveryOutcome::Sent { .. }) => {
            counters.messages_sent += 1;
            counters.vip_promotions += i32::from(promoted);
        }
        RuleOutcome::Delivered(DeliveryOutcome::Failed { .. }) => {
            counters.errors_count += 1;
            counters.vip_promotions += i32::from(promoted);
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerCoordinator
// ---------------------------------------------------------------------------

pub struct TriggerCoordinator {
    store: Arc<dyn AutomationStore>,
    tracker: ClaimTracker,
    composer: MessageComposer,
    dispatcher: Dispatcher,
    recorder: ExecutionRecorder,
    config: EngineConfig,
}

impl TriggerCoordinator {
    pub fn new(
        store: Arc<dyn AutomationStore>,
        gateway: Arc<dyn MessagingGateway>,
        config: EngineConfig,
    ) -> Self {
        let tracker = ClaimTracker::new(store.clone());
        Self {
            composer: MessageComposer::new(store.clone(), config.language_code.clone()),
            dispatcher: Dispatcher::new(gateway, tracker.clone(), config.gateway_timeout),
            recorder: ExecutionRecorder::new(store.clone()),
            tracker,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- Sweeps ----

    /// Run one sweep family across every business, or only `business_id`.
    pub async fn run_sweep(
        &self,
        family: SweepFamily,
        business_id: Option<DbId>,
    ) -> Result<SweepResult, EngineError> {
        self.run_sweep_at(family, business_id, Utc::now()).await
    }

    /// [`run_sweep`](Self::run_sweep) with an explicit clock.
    pub async fn run_sweep_at(
        &self,
        family: SweepFamily,
        business_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<SweepResult, EngineError> {
        let run = self.recorder.start(family.log_event_type(), business_id).await;
        tracing::info!(run_id = %run.run_id, family = family.as_str(), ?business_id, "Automation sweep started");

        let result = match family {
            SweepFamily::Points => self.retry_points(business_id, now).await,
            _ => self.sweep(family, business_id, now).await,
        };
        self.finish(run, result).await
    }

    /// Run every family in order. One family failing does not stop the rest.
    pub async fn run_all(
        &self,
        business_id: Option<DbId>,
    ) -> Vec<(SweepFamily, Result<SweepResult, EngineError>)> {
        let now = Utc::now();
        let mut results = Vec::with_capacity(SweepFamily::RUN_ALL.len());
        for family in SweepFamily::RUN_ALL {
            results.push((family, self.run_sweep_at(family, business_id, now).await));
        }
        results
    }

    // ---- Events ----

    pub async fn handle_event(&self, event: &AutomationEvent) -> Result<SweepResult, EngineError> {
        self.handle_event_at(event, Utc::now()).await
    }

    /// Handle one business event. Check events run the matching sweep scoped
    /// to the business; customer events evaluate only that customer.
    pub async fn handle_event_at(
        &self,
        event: &AutomationEvent,
        now: Timestamp,
    ) -> Result<SweepResult, EngineError> {
        match event {
            AutomationEvent::BirthdayCheck { business_id } => {
                self.run_sweep_at(SweepFamily::Birthday, Some(*business_id), now)
                    .await
            }
            AutomationEvent::InactiveCheck { business_id } => {
                self.run_sweep_at(SweepFamily::Inactive, Some(*business_id), now)
                    .await
            }
            AutomationEvent::CustomerRegistered { customer_id, .. }
            | AutomationEvent::PointsLoaded { customer_id, .. } => {
                let run = self
                    .recorder
                    .start(event.event_type(), Some(event.business_id()))
                    .await;
                let result = self.customer_event(event, *customer_id, now).await;
                self.finish(run, result).await
            }
        }
    }

    async fn customer_event(
        &self,
        event: &AutomationEvent,
        customer_id: DbId,
        now: Timestamp,
    ) -> Result<RunCounters, EngineError> {
        let scope = self
            .load_scope(event.business_id(), event_automation_types(event))
            .await?;
        let customer = self
            .store
            .customer(customer_id)
            .await?
            .filter(|c| c.business_id == scope.business.id)
            .ok_or(EngineError::NotFound {
                entity: "Customer",
                id: customer_id,
            })?;
        if scope.rules.is_empty() {
            return Ok(RunCounters::default());
        }

        let trigger = TriggerKind::Event(event.clone());
        Ok(self.process_customer(&scope, &customer, &trigger, now).await)
    }

    async fn finish(
        &self,
        run: RunHandle,
        result: Result<RunCounters, EngineError>,
    ) -> Result<SweepResult, EngineError> {
        match result {
            Ok(counters) => {
                let duration_ms = self.recorder.complete(&run, &counters, json!({})).await;
                tracing::info!(
                    run_id = %run.run_id,
                    event_type = %run.event_type,
                    customers = counters.customers_processed,
                    sent = counters.messages_sent,
                    errors = counters.errors_count,
                    duration_ms,
                    "Automation run completed",
                );
                Ok(SweepResult {
                    run_id: run.run_id,
                    event_type: run.event_type,
                    business_id: run.business_id,
                    counters,
                    duration_ms,
                })
            }
            Err(e) => {
                self.recorder
                    .fail(&run, &RunCounters::default(), &e.to_string())
                    .await;
                tracing::error!(run_id = %run.run_id, event_type = %run.event_type, error = %e, "Automation run failed");
                Err(e)
            }
        }
    }

    // ---- Scope loading ----

    async fn load_scope(
        &self,
        business_id: DbId,
        types: &[AutomationType],
    ) -> Result<BusinessScope, EngineError> {
        let business = self
            .store
            .business(business_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "Business",
                id: business_id,
            })?;
        let rules = self.store.active_rules(business_id, types).await?;
        Ok(BusinessScope {
            business,
            rules: applicable_rules(rules, types),
        })
    }

    // ---- Sweep internals ----

    async fn sweep(
        &self,
        family: SweepFamily,
        business_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<RunCounters, EngineError> {
        let kind = family.automation_type();
        let trigger = TriggerKind::Sweep(family);
        let business_ids = match business_id {
            Some(id) => vec![id],
            None => self.store.business_ids_with_active_rules(&[kind]).await?,
        };

        let mut totals = RunCounters::default();
        for id in business_ids {
            match self.sweep_business(id, kind, &trigger, now).await {
                Ok(counters) => totals.merge(&counters),
                Err(e) => {
                    tracing::error!(business_id = id, family = family.as_str(), error = %e, "Business sweep failed");
                    totals.errors_count += 1;
                }
            }
        }
        Ok(totals)
    }

    async fn sweep_business(
        &self,
        business_id: DbId,
        kind: AutomationType,
        trigger: &TriggerKind,
        now: Timestamp,
    ) -> Result<RunCounters, EngineError> {
        let scope = self.load_scope(business_id, &[kind]).await?;
        if scope.rules.is_empty() {
            return Ok(RunCounters::default());
        }
        let customers = self.store.customers(business_id).await?;

        let scope = &scope;
        let counters = stream::iter(customers)
            .map(|customer| async move {
                self.process_customer(scope, &customer, trigger, now).await
            })
            .buffer_unordered(self.config.sweep_concurrency.max(1))
            .fold(RunCounters::default(), |mut acc, counters| async move {
                acc.merge(&counters);
                acc
            })
            .await;
        Ok(counters)
    }

    /// Points notifications within the retry window: records whose last
    /// attempt failed, then loads whose event never reached the engine.
    async fn retry_points(
        &self,
        business_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<RunCounters, EngineError> {
        let since = now - Duration::days(self.config.points_retry_days);
        let failed = self
            .store
            .failed_effects_since(AutomationType::PointsNotification, business_id, since)
            .await?;
        let unnotified = self.store.unnotified_point_loads(business_id, since).await?;

        let mut scopes = HashMap::new();
        let mut totals = RunCounters::default();
        for record in &failed {
            let result = match self.failed_point_load(record).await {
                Ok(load) => self.notify_point_load(&load, &mut scopes, now).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(counters) => totals.merge(&counters),
                Err(e) => {
                    tracing::warn!(effect_id = record.id, error = %e, "Points notification retry failed");
                    totals.customers_processed += 1;
                    totals.errors_count += 1;
                }
            }
        }
        for load in &unnotified {
            match self.notify_point_load(load, &mut scopes, now).await {
                Ok(counters) => totals.merge(&counters),
                Err(e) => {
                    tracing::warn!(load_id = load.id, error = %e, "Missed points notification failed");
                    totals.customers_processed += 1;
                    totals.errors_count += 1;
                }
            }
        }
        Ok(totals)
    }

    /// The point load a failed points-notification record refers to.
    async fn failed_point_load(&self, record: &AutomationLog) -> Result<PointLoad, EngineError> {
        let base_key = record.epoch_key.split('/').next().unwrap_or_default();
        let load_id =
            parse_points_load_key(base_key).ok_or(EngineError::MalformedEffect(record.id))?;
        self.store
            .point_load(load_id)
            .await?
            .filter(|load| load.customer_id == record.customer_id)
            .ok_or(EngineError::NotFound {
                entity: "PointLoad",
                id: load_id,
            })
    }

    /// Run the points pipeline for one load as if its event had arrived.
    async fn notify_point_load(
        &self,
        load: &PointLoad,
        scopes: &mut HashMap<DbId, BusinessScope>,
        now: Timestamp,
    ) -> Result<RunCounters, EngineError> {
        let customer = self
            .store
            .customer(load.customer_id)
            .await?
            .ok_or(EngineError::NotFound {
                entity: "Customer",
                id: load.customer_id,
            })?;

        if !scopes.contains_key(&load.business_id) {
            let scope = self
                .load_scope(load.business_id, &[AutomationType::PointsNotification])
                .await?;
            scopes.insert(load.business_id, scope);
        }
        let Some(scope) = scopes.get(&load.business_id) else {
            return Ok(RunCounters::default());
        };

        let trigger = TriggerKind::Event(AutomationEvent::PointsLoaded {
            business_id: load.business_id,
            customer_id: load.customer_id,
            load_id: load.id,
            points_added: load.points,
        });
        Ok(self.process_customer(scope, &customer, &trigger, now).await)
    }

    // ---- Per-customer pipeline ----

    async fn process_customer(
        &self,
        scope: &BusinessScope,
        customer: &Customer,
        trigger: &TriggerKind,
        now: Timestamp,
    ) -> RunCounters {
        let mut counters = RunCounters {
            customers_processed: 1,
            ..Default::default()
        };
        for (rule, kind) in &scope.rules {
            match self
                .process_rule(&scope.business, rule, *kind, customer, trigger, now)
                .await
            {
                Ok(outcome) => {
                    let promoted =
                        *kind == AutomationType::VipEvaluation && !customer.has_tag(VIP_TAG);
                    tally(&mut counters, promoted, &outcome)
                }
                Err(e) => {
                    tracing::warn!(
                        business_id = scope.business.id,
                        customer_id = customer.id,
                        rule_id = rule.id,
                        error = %e,
                        "Customer processing aborted",
                    );
                    counters.errors_count += 1;
                    break;
                }
            }
        }
        counters
    }

    async fn process_rule(
        &self,
        business: &Business,
        rule: &AutomationRule,
        kind: AutomationType,
        customer: &Customer,
        trigger: &TriggerKind,
        now: Timestamp,
    ) -> Result<RuleOutcome, StoreError> {
        let ctx = EvaluationContext {
            now,
            trigger,
            config: &self.config,
        };
        let (epoch_key, vip_threshold) = match evaluate(rule, customer, business, &ctx) {
            Eligibility::Eligible {
                epoch_key,
                vip_threshold,
            } => (epoch_key, vip_threshold),
            Eligibility::Ineligible(IneligibleReason::AlreadyVip) => {
                if !self.vip_message_failed(business.id, customer.id).await? {
                    return Ok(RuleOutcome::Ineligible(IneligibleReason::AlreadyVip));
                }
                (VIP_EPOCH_KEY.to_string(), None)
            }
            Eligibility::Ineligible(reason) => return Ok(RuleOutcome::Ineligible(reason)),
        };

        // Composition precedes the claim; a misconfigured rule leaves no record.
        let wants_message = customer.has_phone() && (kind.requires_message() || rule.has_template());
        let message = if wants_message {
            match self
                .composer
                .compose(rule, kind, customer, business, trigger, now)
                .await
            {
                Ok(message) => Some(message),
                Err(ComposeError::Lookup(e)) => return Err(e),
                Err(e) => {
                    tracing::warn!(rule_id = rule.id, customer_id = customer.id, error = %e, "Message composition failed");
                    return Ok(RuleOutcome::ComposeFailed(e.to_string()));
                }
            }
        } else {
            None
        };

        let key = effect_key(business.id, customer.id, kind, &epoch_key);
        let claim = match self.tracker.try_claim(&key).await? {
            ClaimOutcome::Claimed(claim) => claim,
            ClaimOutcome::AlreadyClaimed => {
                tracing::debug!(customer_id = customer.id, automation_type = kind.as_str(), %epoch_key, "Effect already claimed");
                return Ok(RuleOutcome::AlreadyClaimed);
            }
        };

        let mut detail = json!({ "trigger": trigger.label(), "rule_id": rule.id });
        if let Some(threshold) = vip_threshold {
            detail["vip_threshold"] = json!(threshold);
        }

        if kind == AutomationType::VipEvaluation && !customer.has_tag(VIP_TAG) {
            if let Err(e) = self.store.add_tag(customer.id, VIP_TAG).await {
                detail["error"] = json!(format!("tag update failed: {e}"));
                if let Err(record_err) = self.tracker.record(&claim, EffectStatus::Failed, &detail).await {
                    tracing::error!(effect_id = claim.id, error = %record_err, "Failed to record effect outcome");
                }
                return Err(e);
            }
            tracing::info!(
                business_id = business.id,
                customer_id = customer.id,
                threshold = ?vip_threshold,
                "Customer promoted to VIP",
            );
        }

        let Some(message) = message else {
            detail["reason"] = json!(if customer.has_phone() { "no_template" } else { "no_phone" });
            self.tracker
                .record(&claim, EffectStatus::Skipped, &detail)
                .await?;
            return Ok(RuleOutcome::Skipped);
        };

        detail["template"] = json!(message.template_name);
        detail["parameters"] = json!(message.parameters);
        detail["language_code"] = json!(message.language_code);
        detail["fallback_text"] = json!(message.fallback_text);

        let outcome = self
            .dispatcher
            .deliver(&claim, &message, &customer.phone, detail)
            .await;
        Ok(RuleOutcome::Delivered(outcome))
    }

    /// A tagged customer whose VIP message failed stays re-claimable; the
    /// tag alone must not hide the failed record from later runs.
    async fn vip_message_failed(
        &self,
        business_id: DbId,
        customer_id: DbId,
    ) -> Result<bool, StoreError> {
        let key = effect_key(
            business_id,
            customer_id,
            AutomationType::VipEvaluation,
            VIP_EPOCH_KEY,
        );
        Ok(self
            .store
            .find_effect(&key)
            .await?
            .is_some_and(|record| record.status == EffectStatus::Failed.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
