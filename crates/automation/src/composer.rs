//! Message composition.
//!
//! [`MessageComposer::compose`] resolves the offer text (active promotion
//! first, then the next redeemable reward) and hands off to the pure
//! [`build_message`], which fills each template's parameter contract.

use std::sync::Arc;

use cadence_core::automation::AutomationType;
use cadence_core::templates::expected_parameter_count;
use cadence_core::types::Timestamp;
use cadence_core::vip::days_since;
use cadence_db::models::automation::AutomationRule;
use cadence_db::models::business::Business;
use cadence_db::models::customer::Customer;
use cadence_db::models::promotion::Promotion;
use cadence_db::models::redeemable_item::RedeemableItem;
use cadence_messaging::TemplateMessage;
use serde::Serialize;

use crate::eligibility::TriggerKind;
use crate::error::StoreError;
use crate::store::AutomationStore;

const FALLBACK_NAME: &str = "Customer";
const KEEP_COLLECTING: &str = "Keep collecting points for exclusive rewards";

/// A composed message ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedMessage {
    pub template_name: String,
    pub parameters: Vec<String>,
    /// Plain-text rendering for logs and providers without templates.
    pub fallback_text: String,
    pub language_code: String,
}

impl ComposedMessage {
    pub fn to_template(&self, phone: &str) -> TemplateMessage {
        TemplateMessage {
            phone: phone.to_string(),
            template_name: self.template_name.clone(),
            parameters: self.parameters.clone(),
            language_code: self.language_code.clone(),
        }
    }
}

/// Error type for composition. Nothing has been claimed when one of these
/// is returned.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("Rule has no message template")]
    MissingTemplate,

    #[error("Template expects {expected} parameters, composed {actual}")]
    ParameterCount { expected: usize, actual: usize },

    #[error("Points notification composed without a point load")]
    MissingPointLoad,

    #[error(transparent)]
    Lookup(#[from] StoreError),
}

/// Where the offer text came from.
#[derive(Debug, Clone)]
pub enum Offer {
    Promotion(Promotion),
    Reward { item: RedeemableItem, points: i32 },
    None,
}

impl Offer {
    pub fn text(&self) -> String {
        match self {
            Offer::Promotion(p) => promotion_text(p),
            Offer::Reward { item, points } => {
                let remaining = item.points_required - points;
                if remaining <= 0 {
                    format!("You can redeem {} now", item.name)
                } else {
                    format!("Only {remaining} more points to get {}", item.name)
                }
            }
            Offer::None => KEEP_COLLECTING.to_string(),
        }
    }
}

fn promotion_text(promotion: &Promotion) -> String {
    let mut text = promotion.title.trim().to_string();
    let description = promotion.description.trim();
    if !description.is_empty() {
        text = format!("{text}: {description}");
    }
    if let Some(pct) = promotion.discount_percentage.filter(|p| *p > 0) {
        text = format!("{text} ({pct}% off)");
    }
    text
}

/// Inputs to [`build_message`] beyond the rule and customer.
#[derive(Debug, Clone, Copy)]
pub struct CompositionInput<'a> {
    pub offer: &'a Offer,
    pub now: Timestamp,
    pub trigger: &'a TriggerKind,
    pub language_code: &'a str,
}

/// Check a parameter list against the template contract of `kind`.
pub fn check_contract(kind: AutomationType, parameters: &[String]) -> Result<(), ComposeError> {
    let expected = expected_parameter_count(kind);
    if parameters.len() != expected {
        return Err(ComposeError::ParameterCount {
            expected,
            actual: parameters.len(),
        });
    }
    Ok(())
}

/// Compose the message for `rule` and `customer`.
pub fn build_message(
    rule: &AutomationRule,
    kind: AutomationType,
    customer: &Customer,
    input: &CompositionInput<'_>,
) -> Result<ComposedMessage, ComposeError> {
    if !rule.has_template() {
        return Err(ComposeError::MissingTemplate);
    }

    let name = match customer.name.trim() {
        "" => FALLBACK_NAME.to_string(),
        n => n.to_string(),
    };
    let offer = input.offer.text();

    let (parameters, fallback_text) = match kind {
        AutomationType::Birthday => (
            vec![name.clone(), offer.clone()],
            format!("Happy birthday, {name}! {offer}"),
        ),
        AutomationType::VipEvaluation => (
            vec![name.clone(), offer.clone()],
            format!("Congratulations {name}, you are now a VIP member! {offer}"),
        ),
        AutomationType::Inactive => {
            let days = days_since(customer.last_interaction, input.now).to_string();
            (
                vec![name.clone(), days.clone(), offer.clone()],
                format!("We miss you, {name}! It has been {days} days since your last visit. {offer}"),
            )
        }
        AutomationType::PointsNotification => {
            let points = input
                .trigger
                .points_added()
                .ok_or(ComposeError::MissingPointLoad)?
                .to_string();
            (
                vec![name.clone(), points.clone(), offer.clone()],
                format!("Hi {name}, you just earned {points} points. {offer}"),
            )
        }
        AutomationType::MissingFields => {
            let fields = customer.missing_profile_fields().join(", ");
            (
                vec![name.clone(), fields.clone()],
                format!("Hi {name}, please complete your profile: {fields}."),
            )
        }
    };

    check_contract(kind, &parameters)?;

    Ok(ComposedMessage {
        template_name: rule.message_template.trim().to_string(),
        parameters,
        fallback_text,
        language_code: input.language_code.to_string(),
    })
}

/// Resolves offers from the store and composes messages.
#[derive(Clone)]
pub struct MessageComposer {
    store: Arc<dyn AutomationStore>,
    default_language: String,
}

impl MessageComposer {
    pub fn new(store: Arc<dyn AutomationStore>, default_language: impl Into<String>) -> Self {
        Self {
            store,
            default_language: default_language.into(),
        }
    }

    /// The rule's promotion when active at `now`, else the customer's next
    /// reward, else nothing.
    pub async fn resolve_offer(
        &self,
        rule: &AutomationRule,
        customer: &Customer,
        now: Timestamp,
    ) -> Result<Offer, StoreError> {
        if let Some(promotion_id) = rule.promotion_id {
            match self.store.promotion(promotion_id).await? {
                Some(p) if p.business_id == rule.business_id && p.is_active_at(now) => {
                    return Ok(Offer::Promotion(p));
                }
                _ => tracing::debug!(rule_id = rule.id, promotion_id, "Promotion not applicable"),
            }
        }

        Ok(
            match self
                .store
                .next_reward(customer.business_id, customer.points)
                .await?
            {
                Some(item) => Offer::Reward {
                    item,
                    points: customer.points,
                },
                None => Offer::None,
            },
        )
    }

    pub async fn compose(
        &self,
        rule: &AutomationRule,
        kind: AutomationType,
        customer: &Customer,
        business: &Business,
        trigger: &TriggerKind,
        now: Timestamp,
    ) -> Result<ComposedMessage, ComposeError> {
        if !rule.has_template() {
            return Err(ComposeError::MissingTemplate);
        }
        let offer = self.resolve_offer(rule, customer, now).await?;
        let language_code = business
            .language_code
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.default_language);

        build_message(
            rule,
            kind,
            customer,
            &CompositionInput {
                offer: &offer,
                now,
                trigger,
                language_code,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
