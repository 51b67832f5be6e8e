//! Integration tests for effect-record claims and point loads.
//!
//! These need a Postgres instance (`DATABASE_URL`); run with
//! `cargo test -p cadence-db -- --ignored`.

use cadence_core::automation::EffectStatus;
use cadence_db::models::automation_log::EffectKey;
use cadence_db::models::point_load::CreatePointLoad;
use cadence_db::repositories::{
    AutomationLogRepo, CustomerRepo, PointLoadRepo, RedeemableItemRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_customer(pool: &PgPool) -> (i64, i64) {
    let business_id: i64 =
        sqlx::query_scalar("INSERT INTO businesses (name) VALUES ('Cafe Aurora') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let customer_id: i64 = sqlx::query_scalar(
        "INSERT INTO customers (business_id, phone, name) VALUES ($1, '5215550001', 'Ana') \
         RETURNING id",
    )
    .bind(business_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (business_id, customer_id)
}

fn birthday_key(business_id: i64, customer_id: i64) -> EffectKey {
    EffectKey {
        business_id,
        customer_id,
        automation_type: "birthday".to_string(),
        epoch_key: "2025".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn second_claim_for_same_identity_is_rejected(pool: PgPool) {
    let (business_id, customer_id) = seed_customer(&pool).await;
    let key = birthday_key(business_id, customer_id);

    let first = AutomationLogRepo::try_claim(&pool, &key).await.unwrap();
    assert!(first.is_some());

    let second = AutomationLogRepo::try_claim(&pool, &key).await.unwrap();
    assert!(second.is_none(), "pending claim must block a second claim");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failed_claim_can_be_reclaimed_but_sent_cannot(pool: PgPool) {
    let (business_id, customer_id) = seed_customer(&pool).await;
    let key = birthday_key(business_id, customer_id);

    let claim = AutomationLogRepo::try_claim(&pool, &key).await.unwrap().unwrap();
    AutomationLogRepo::record_outcome(
        &pool,
        claim.id,
        EffectStatus::Failed,
        &serde_json::json!({"error": "timeout"}),
    )
    .await
    .unwrap();

    let retry = AutomationLogRepo::try_claim(&pool, &key).await.unwrap().unwrap();
    assert_eq!(retry.id, claim.id);
    assert_eq!(retry.attempts, 2);

    AutomationLogRepo::record_outcome(
        &pool,
        retry.id,
        EffectStatus::Sent,
        &serde_json::json!({"message_id": "wamid.1"}),
    )
    .await
    .unwrap();

    assert!(AutomationLogRepo::try_claim(&pool, &key).await.unwrap().is_none());

    let row = AutomationLogRepo::find_by_key(&pool, &key).await.unwrap().unwrap();
    assert_eq!(row.status, "sent");
    assert_eq!(row.detail["message_id"], "wamid.1");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_claims_yield_exactly_one_winner(pool: PgPool) {
    let (business_id, customer_id) = seed_customer(&pool).await;
    let key = birthday_key(business_id, customer_id);

    let attempts = (0..8).map(|_| {
        let pool = pool.clone();
        let key = key.clone();
        tokio::spawn(async move { AutomationLogRepo::try_claim(&pool, &key).await.unwrap() })
    });

    let mut winners = 0;
    for handle in attempts {
        if handle.await.unwrap().is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

// ---------------------------------------------------------------------------
// Customers and catalog
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn add_tag_is_idempotent(pool: PgPool) {
    let (_, customer_id) = seed_customer(&pool).await;

    assert!(CustomerRepo::add_tag(&pool, customer_id, "VIP").await.unwrap());
    assert!(!CustomerRepo::add_tag(&pool, customer_id, "VIP").await.unwrap());

    let customer = CustomerRepo::find_by_id(&pool, customer_id).await.unwrap().unwrap();
    assert_eq!(customer.tags, vec!["VIP".to_string()]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn point_load_increments_customer_counters(pool: PgPool) {
    let (business_id, customer_id) = seed_customer(&pool).await;

    let load = PointLoadRepo::create(
        &pool,
        &CreatePointLoad {
            customer_id,
            points: 25,
            amount_cents: 12_500,
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(load.business_id, business_id);

    let customer = CustomerRepo::find_by_id(&pool, customer_id).await.unwrap().unwrap();
    assert_eq!(customer.points, 25);
    assert_eq!(customer.total_spent_cents, 12_500);
    assert_eq!(customer.visit_count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn point_load_for_unknown_customer_returns_none(pool: PgPool) {
    let load = PointLoadRepo::create(
        &pool,
        &CreatePointLoad {
            customer_id: 999_999,
            points: 5,
            amount_cents: 0,
        },
    )
    .await
    .unwrap();
    assert!(load.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn next_reward_picks_cheapest_item_at_or_above_balance(pool: PgPool) {
    let (business_id, _) = seed_customer(&pool).await;
    sqlx::query(
        "INSERT INTO redeemable_items (business_id, name, points_required, is_active) VALUES \
            ($1, 'Espresso', 50, TRUE), \
            ($1, 'Croissant', 120, TRUE), \
            ($1, 'Latte', 100, TRUE), \
            ($1, 'Retired mug', 90, FALSE)",
    )
    .bind(business_id)
    .execute(&pool)
    .await
    .unwrap();

    let item = RedeemableItemRepo::next_reward(&pool, business_id, 80)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.name, "Latte");

    assert!(RedeemableItemRepo::next_reward(&pool, business_id, 500)
        .await
        .unwrap()
        .is_none());
}
