//! Integration tests for the disbursement webhook reconciliation endpoint.

mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{body_json, post_json, TEST_CALLBACK_TOKEN};
use rust_decimal_macros::dec;
use serde_json::json;
use sqlx::PgPool;

const WEBHOOK_URI: &str = "/api/v1/webhooks/disbursements";

async fn payout_row(pool: &PgPool, id: i64) -> (String, Option<DateTime<Utc>>, Option<String>) {
    sqlx::query_as::<_, (String, Option<DateTime<Utc>>, Option<String>)>(
        "SELECT status, processed_at, gateway_disbursement_id \
         FROM affiliate_payouts WHERE id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn conversion_status(pool: &PgPool, id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM affiliate_conversions WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Authentication and validation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_rejected_with_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        WEBHOOK_URI,
        &[],
        json!({ "id": "d1", "reference_id": "r1", "status": "SUCCEEDED" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_token_is_rejected_with_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        WEBHOOK_URI,
        &[("x-callback-token", "not-the-token")],
        json!({ "id": "d1", "reference_id": "r1", "status": "SUCCEEDED" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn payload_missing_required_fields_is_rejected_with_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({ "id": "d1", "status": "SUCCEEDED" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// No-match acknowledgment
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn unmatched_payout_is_acknowledged_without_error(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({ "id": "disb-x", "reference_id": "no-such-payout", "status": "SUCCEEDED" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["received"], true);
    assert!(json.get("payout_id").is_none());
}

// ---------------------------------------------------------------------------
// Successful reconciliation and the paid cascade
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn success_webhook_marks_payout_sent_and_cascades_paid(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let conversion_id =
        common::seed_conversion(&pool, affiliate_id, dec!(3000), "cleared", 40).await;
    let payout_id =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "processing", "payout-ref-1").await;
    common::seed_payout_item(&pool, payout_id, conversion_id, dec!(3000)).await;

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({
            "id": "disb-1",
            "reference_id": "payout-ref-1",
            "status": "SUCCEEDED",
            "channel_code": "BDO",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["received"], true);
    assert_eq!(json["payout_id"], payout_id);
    assert_eq!(json["status_updated"], "sent");

    let (status, processed_at, gateway_id) = payout_row(&pool, payout_id).await;
    assert_eq!(status, "sent");
    assert!(processed_at.is_some());
    assert_eq!(gateway_id.as_deref(), Some("disb-1"));

    assert_eq!(conversion_status(&pool, conversion_id).await, "paid");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn replaying_the_same_webhook_is_a_no_op(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let conversion_id =
        common::seed_conversion(&pool, affiliate_id, dec!(3000), "cleared", 40).await;
    let payout_id =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "processing", "payout-ref-1").await;
    common::seed_payout_item(&pool, payout_id, conversion_id, dec!(3000)).await;

    let payload = json!({
        "id": "disb-1",
        "reference_id": "payout-ref-1",
        "status": "SUCCEEDED",
    });

    let first = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        payload.clone(),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let (_, processed_after_first, _) = payout_row(&pool, payout_id).await;

    let second = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        payload,
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
    let json = body_json(second).await;
    assert_eq!(json["received"], true);
    assert!(json.get("status_updated").is_none(), "replay must not transition again");

    let (status, processed_after_second, _) = payout_row(&pool, payout_id).await;
    assert_eq!(status, "sent");
    assert_eq!(
        processed_after_first, processed_after_second,
        "processed_at must not change on replay"
    );
    assert_eq!(conversion_status(&pool, conversion_id).await, "paid");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn late_processing_webhook_cannot_rewind_a_sent_payout(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let payout_id =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "sent", "payout-ref-1").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({ "id": "disb-1", "reference_id": "payout-ref-1", "status": "PENDING" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let (status, _, _) = payout_row(&pool, payout_id).await;
    assert_eq!(status, "sent");
}

// ---------------------------------------------------------------------------
// Failure path
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_webhook_records_failure_without_paying_conversions(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let conversion_id =
        common::seed_conversion(&pool, affiliate_id, dec!(3000), "cleared", 40).await;
    let payout_id =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "processing", "payout-ref-1").await;
    common::seed_payout_item(&pool, payout_id, conversion_id, dec!(3000)).await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({
            "id": "disb-1",
            "reference_id": "payout-ref-1",
            "status": "FAILED",
            "failure_code": "INSUFFICIENT_BALANCE",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status_updated"], "failed");

    let (status, processed_at, _) = payout_row(&pool, payout_id).await;
    assert_eq!(status, "failed");
    assert!(processed_at.is_none(), "processed_at is success-only");

    let (failed_at, failure_reason) = sqlx::query_as::<_, (Option<DateTime<Utc>>, Option<String>)>(
        "SELECT failed_at, failure_reason FROM affiliate_payouts WHERE id = $1",
    )
    .bind(payout_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(failed_at.is_some());
    assert_eq!(failure_reason.as_deref(), Some("INSUFFICIENT_BALANCE"));

    assert_eq!(conversion_status(&pool, conversion_id).await, "cleared");
}

// ---------------------------------------------------------------------------
// Lookup strategies and payload shapes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn metadata_payout_id_matches_before_reference(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let payout_id =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "processing", "payout-ref-1").await;

    // The reference in the payload matches nothing; metadata carries the ID.
    let response = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({
            "id": "disb-1",
            "reference_id": "some-external-reference",
            "status": "SUCCEEDED",
            "metadata": { "payout_id": payout_id },
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["payout_id"], payout_id);

    let (status, _, _) = payout_row(&pool, payout_id).await;
    assert_eq!(status, "sent");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn enveloped_payload_is_unwrapped(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let payout_id =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "pending", "payout-ref-1").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({
            "event": "disbursement.status",
            "data": {
                "id": "disb-1",
                "reference_id": "payout-ref-1",
                "status": "ACCEPTED",
            },
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let (status, _, _) = payout_row(&pool, payout_id).await;
    assert_eq!(status, "processing");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn batch_payload_reconciles_each_entry(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let first =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "processing", "payout-ref-1").await;
    let second =
        common::seed_payout(&pool, affiliate_id, dec!(1000), "processing", "payout-ref-2").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({
            "batch_id": "batch-9",
            "disbursements": [
                { "id": "d1", "reference_id": "payout-ref-1", "status": "SUCCEEDED" },
                { "id": "d2", "reference_id": "payout-ref-2", "status": "FAILED" },
            ],
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["received"], true);
    assert_eq!(json["type"], "batch_disbursement");
    assert_eq!(json["batch_id"], "batch-9");
    assert_eq!(json["processed_count"], 2);

    let (first_status, _, _) = payout_row(&pool, first).await;
    let (second_status, _, _) = payout_row(&pool, second).await;
    assert_eq!(first_status, "sent");
    assert_eq!(second_status, "failed");
}

// ---------------------------------------------------------------------------
// Unknown gateway status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_gateway_status_is_acknowledged_without_update(pool: PgPool) {
    let affiliate_id = common::seed_affiliate(&pool, "maria@example.com", true).await;
    let payout_id =
        common::seed_payout(&pool, affiliate_id, dec!(3000), "processing", "payout-ref-1").await;

    let response = post_json(
        common::build_test_app(pool.clone()),
        WEBHOOK_URI,
        &[("x-callback-token", TEST_CALLBACK_TOKEN)],
        json!({ "id": "disb-1", "reference_id": "payout-ref-1", "status": "REVERSED" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["received"], true);

    let (status, _, _) = payout_row(&pool, payout_id).await;
    assert_eq!(status, "processing");
}
