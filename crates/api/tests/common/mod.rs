//! Shared helpers for API integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower::ServiceExt;

use payrun_api::config::{EmailConfig, GatewayConfig, ServerConfig};
use payrun_api::gateway::DisbursementClient;
use payrun_api::notifications::EmailClient;
use payrun_api::router::build_app;
use payrun_api::state::AppState;

/// Callback token the test app expects from the webhook tests.
pub const TEST_CALLBACK_TOKEN: &str = "test-callback-token";

/// Build a test `ServerConfig` with safe defaults.
///
/// Email sending is disabled (no API URL) and the gateway points at a
/// placeholder host; nothing in these tests performs outbound HTTP.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        webhook_callback_token: TEST_CALLBACK_TOKEN.to_string(),
        gateway: GatewayConfig {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            currency: "PHP".to_string(),
        },
        email: EmailConfig {
            api_url: None,
            api_token: String::new(),
            from_address: "payouts@example.com".to_string(),
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool. This is the same stack production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        gateway: Arc::new(DisbursementClient::new(&config.gateway)),
        mailer: Arc::new(EmailClient::new(config.email.clone())),
        config: Arc::new(config),
    };
    build_app(state)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a POST request with a JSON body and optional extra headers.
pub async fn post_json(
    app: Router,
    uri: &str,
    headers: &[(&str, &str)],
    body: serde_json::Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seeding helpers
// ---------------------------------------------------------------------------

/// Insert a profile + affiliate with verified bank credentials.
/// Returns the affiliate ID.
pub async fn seed_affiliate(pool: &PgPool, email: &str, bank_verified: bool) -> i64 {
    let profile_id: i64 = sqlx::query_scalar(
        "INSERT INTO unified_profiles (first_name, last_name, email) \
         VALUES ('Maria', 'Santos', $1) RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query_scalar(
        "INSERT INTO affiliates \
             (user_id, commission_tier, account_holder_name, account_number, \
              bank_name, bank_account_verified) \
         VALUES ($1, 'Bronze', 'Maria Santos', '0012345678', 'BDO', $2) \
         RETURNING id",
    )
    .bind(profile_id)
    .bind(bank_verified)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a profile + affiliate with no payout credentials at all.
pub async fn seed_affiliate_without_credentials(pool: &PgPool, email: &str) -> i64 {
    let profile_id: i64 = sqlx::query_scalar(
        "INSERT INTO unified_profiles (first_name, last_name, email) \
         VALUES ('Juan', 'Reyes', $1) RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query_scalar(
        "INSERT INTO affiliates (user_id) VALUES ($1) RETURNING id",
    )
    .bind(profile_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a conversion created `days_ago` days in the past.
pub async fn seed_conversion(
    pool: &PgPool,
    affiliate_id: i64,
    amount: Decimal,
    status: &str,
    days_ago: i64,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO affiliate_conversions \
             (affiliate_id, commission_amount, gmv, status, created_at, \
              cleared_at) \
         VALUES ($1, $2, $2 * 5, $3, \
                 NOW() - make_interval(days => $4::int), \
                 CASE WHEN $3 IN ('cleared', 'paid') THEN NOW() END) \
         RETURNING id",
    )
    .bind(affiliate_id)
    .bind(amount)
    .bind(status)
    .bind(days_ago as i32)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Insert a payout with the given status and reference.
pub async fn seed_payout(
    pool: &PgPool,
    affiliate_id: i64,
    amount: Decimal,
    status: &str,
    reference: &str,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO affiliate_payouts \
             (affiliate_id, amount, fee_amount, net_amount, status, \
              payout_method, reference) \
         VALUES ($1, $2, $2 * 0.02, $2 * 0.98, $3, 'bank_transfer', $4) \
         RETURNING id",
    )
    .bind(affiliate_id)
    .bind(amount)
    .bind(status)
    .bind(reference)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// Link a conversion to a payout (payout item + `payout_id` stamp).
pub async fn seed_payout_item(
    pool: &PgPool,
    payout_id: i64,
    conversion_id: i64,
    amount: Decimal,
) {
    sqlx::query("INSERT INTO payout_items (payout_id, conversion_id, amount) VALUES ($1, $2, $3)")
        .bind(payout_id)
        .bind(conversion_id)
        .bind(amount)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("UPDATE affiliate_conversions SET payout_id = $1 WHERE id = $2")
        .bind(payout_id)
        .bind(conversion_id)
        .execute(pool)
        .await
        .unwrap();
}
