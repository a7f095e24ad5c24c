//! Gateway disbursement webhook reconciliation.
//!
//! The gateway calls back with status changes for disbursements we created
//! (and occasionally for ones we didn't). The handler authenticates via the
//! `x-callback-token` shared secret, converts the dynamic payload into a
//! typed event at the boundary, locates the payout through an ordered chain
//! of lookup strategies, and applies an idempotent status transition.
//!
//! Response policy follows gateway-webhook convention: once authentication
//! and payload validation pass, business outcomes (no match, no change,
//! unknown status) are acknowledged with 200 so the gateway does not retry
//! already-handled deliveries.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use payrun_core::error::CoreError;
use payrun_core::gateway;
use payrun_core::status::PayoutStatus;
use payrun_core::types::DbId;
use payrun_db::models::payout::Payout;
use payrun_db::repositories::{AffiliateRepo, ConversionRepo, PayoutItemRepo, PayoutRepo};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

/// One disbursement status event. `id`, `reference_id`, and `status` are
/// required; everything else is advisory.
#[derive(Debug, Clone, Deserialize)]
pub struct DisbursementEvent {
    pub id: String,
    pub reference_id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub channel_code: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub failure_code: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// A batch callback carrying one event per disbursement.
#[derive(Debug, Deserialize)]
pub struct BatchDisbursementPayload {
    #[serde(default)]
    pub batch_id: Option<String>,
    pub disbursements: Vec<DisbursementEvent>,
}

/// The two payload families the gateway sends.
#[derive(Debug)]
pub enum WebhookPayload {
    Single(DisbursementEvent),
    Batch(BatchDisbursementPayload),
}

/// Parse the raw JSON body into a typed payload.
///
/// Supports both the direct shape and the enveloped `{event, data}` shape;
/// a `disbursements[]` array marks a batch payload. Anything that fails to
/// produce the required fields is a validation error.
pub fn parse_webhook_payload(body: &Value) -> Result<WebhookPayload, String> {
    let inner = match (body.get("event"), body.get("data")) {
        (Some(_), Some(data)) => data,
        _ => body,
    };

    if inner
        .get("disbursements")
        .is_some_and(Value::is_array)
    {
        return serde_json::from_value(inner.clone())
            .map(WebhookPayload::Batch)
            .map_err(|e| format!("Invalid batch disbursement payload: {e}"));
    }

    serde_json::from_value(inner.clone())
        .map(WebhookPayload::Single)
        .map_err(|e| format!("Missing required webhook fields (id, reference_id, status): {e}"))
}

/// Extract an embedded internal payout ID from the event metadata, if the
/// caller round-tripped one. Accepts both numeric and string encodings.
pub fn metadata_payout_id(event: &DisbursementEvent) -> Option<DbId> {
    match event.metadata.as_ref()?.get("payout_id")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /api/v1/webhooks/disbursements
pub async fn receive_disbursement_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    authenticate(&headers, &state.config.webhook_callback_token)?;

    match parse_webhook_payload(&body).map_err(AppError::BadRequest)? {
        WebhookPayload::Single(event) => {
            let outcome = reconcile_event(&state, &event).await?;
            Ok(Json(single_ack(&outcome)))
        }
        WebhookPayload::Batch(batch) => {
            let mut processed_count = 0usize;
            for event in &batch.disbursements {
                // Per-item isolation: one bad entry must not block the rest
                // or fail the acknowledgment.
                match reconcile_event(&state, event).await {
                    Ok(_) => processed_count += 1,
                    Err(e) => {
                        tracing::error!(
                            disbursement_id = %event.id,
                            reference_id = %event.reference_id,
                            error = %e,
                            "Failed to reconcile batch disbursement entry"
                        );
                    }
                }
            }
            Ok(Json(json!({
                "received": true,
                "type": "batch_disbursement",
                "batch_id": batch.batch_id,
                "processed_count": processed_count,
            })))
        }
    }
}

/// Reject the callback unless the shared-secret token matches exactly.
/// An unset token rejects everything.
fn authenticate(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let provided = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if expected_token.is_empty() || provided != expected_token {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid callback token".to_owned(),
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// What happened to one event.
#[derive(Debug)]
enum ReconcileOutcome {
    /// The payout transitioned to a new status.
    Updated { payout_id: DbId, status: PayoutStatus },
    /// Redelivery or out-of-order event; nothing changed.
    NoChange { payout_id: DbId },
    /// No payout matched any lookup strategy.
    NoMatch,
    /// The gateway status is outside the known vocabulary.
    UnknownStatus,
}

fn single_ack(outcome: &ReconcileOutcome) -> Value {
    match outcome {
        ReconcileOutcome::Updated { payout_id, status } => json!({
            "received": true,
            "payout_id": payout_id,
            "status_updated": status.as_str(),
        }),
        ReconcileOutcome::NoChange { payout_id } => json!({
            "received": true,
            "payout_id": payout_id,
        }),
        ReconcileOutcome::NoMatch | ReconcileOutcome::UnknownStatus => json!({
            "received": true,
        }),
    }
}

/// Locate the payout for an event, trying each strategy in order and
/// stopping at the first hit:
///
/// 1. embedded metadata `payout_id`
/// 2. our `reference` equal to the gateway's `reference_id`
/// 3. stored gateway disbursement ID equal to the incoming `id`
async fn locate_payout(
    pool: &payrun_db::DbPool,
    event: &DisbursementEvent,
) -> Result<Option<Payout>, sqlx::Error> {
    if let Some(payout_id) = metadata_payout_id(event) {
        if let Some(payout) = PayoutRepo::find_by_id(pool, payout_id).await? {
            return Ok(Some(payout));
        }
    }
    if let Some(payout) = PayoutRepo::find_by_reference(pool, &event.reference_id).await? {
        return Ok(Some(payout));
    }
    PayoutRepo::find_by_gateway_id(pool, &event.id).await
}

/// Apply one event to its payout. Used by both the single and batch paths.
async fn reconcile_event(
    state: &AppState,
    event: &DisbursementEvent,
) -> Result<ReconcileOutcome, AppError> {
    let Some(payout) = locate_payout(&state.pool, event).await? else {
        // Payouts created out-of-band reach us too; acknowledging instead
        // of erroring prevents gateway retry storms.
        tracing::info!(
            disbursement_id = %event.id,
            reference_id = %event.reference_id,
            status = %event.status,
            "Webhook for unknown payout acknowledged"
        );
        return Ok(ReconcileOutcome::NoMatch);
    };

    let Some(new_status) = gateway::map_status(&event.status) else {
        tracing::warn!(
            payout_id = payout.id,
            status = %event.status,
            "Unknown gateway status, acknowledged without update"
        );
        return Ok(ReconcileOutcome::UnknownStatus);
    };

    let current = PayoutStatus::parse(&payout.status)
        .map_err(|e| AppError::InternalError(format!("Stored payout status invalid: {e}")))?;

    // Idempotent short-circuit: redeliveries and out-of-order events that
    // would rewind a terminal status are acknowledged without mutation.
    if new_status == current || !current.can_transition_to(new_status) {
        if new_status != current {
            tracing::warn!(
                payout_id = payout.id,
                current = current.as_str(),
                incoming = new_status.as_str(),
                "Ignoring webhook that would rewind payout status"
            );
        }
        return Ok(ReconcileOutcome::NoChange { payout_id: payout.id });
    }

    let channel = event
        .channel_code
        .as_deref()
        .unwrap_or(&payout.payout_method);
    let failure_reason = event
        .failure_reason
        .as_deref()
        .or(event.failure_code.as_deref());
    let notes = match new_status {
        PayoutStatus::Sent => format!("Payment completed successfully via {channel}"),
        PayoutStatus::Failed => format!(
            "Payment failed: {}",
            failure_reason.unwrap_or("Unknown error")
        ),
        _ => format!("Payment is being processed via {channel}"),
    };

    PayoutRepo::apply_webhook_update(
        &state.pool,
        payout.id,
        new_status.as_str(),
        &event.id,
        &notes,
        new_status == PayoutStatus::Sent,
        if new_status == PayoutStatus::Failed {
            Some(failure_reason.unwrap_or("Unknown error"))
        } else {
            None
        },
    )
    .await?;

    tracing::info!(
        payout_id = payout.id,
        previous = current.as_str(),
        new = new_status.as_str(),
        disbursement_id = %event.id,
        "Payout status updated via webhook"
    );

    if new_status == PayoutStatus::Sent {
        cascade_conversions_paid(&state.pool, payout.id).await;
    }

    notify_affiliate(state, &payout, new_status, failure_reason).await;

    Ok(ReconcileOutcome::Updated {
        payout_id: payout.id,
        status: new_status,
    })
}

/// Mark the payout's conversions `paid`. The payout update has already
/// committed, so failures here are logged and never fail the webhook.
async fn cascade_conversions_paid(pool: &payrun_db::DbPool, payout_id: DbId) {
    let conversion_ids = match PayoutItemRepo::conversion_ids_for_payout(pool, payout_id).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(payout_id, error = %e, "Failed to load payout items for paid cascade");
            return;
        }
    };
    if conversion_ids.is_empty() {
        return;
    }

    match ConversionRepo::mark_paid_many(pool, &conversion_ids).await {
        Ok(updated) => {
            tracing::info!(payout_id, updated, "Conversions marked paid");
        }
        Err(e) => {
            tracing::error!(payout_id, error = %e, "Failed to mark conversions paid");
        }
    }
}

/// Best-effort status notification to the affiliate.
async fn notify_affiliate(
    state: &AppState,
    payout: &Payout,
    status: PayoutStatus,
    failure_reason: Option<&str>,
) {
    let contact = match AffiliateRepo::contact_for(&state.pool, payout.affiliate_id).await {
        Ok(Some(contact)) => contact,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(
                affiliate_id = payout.affiliate_id,
                error = %e,
                "Failed to load affiliate contact for notification"
            );
            return;
        }
    };

    let name = contact.display_name();
    match status {
        PayoutStatus::Processing => {
            state
                .mailer
                .payout_processing(&contact.email, &name, payout.net_amount, &payout.payout_method)
                .await;
        }
        PayoutStatus::Sent => {
            state
                .mailer
                .payout_success(
                    &contact.email,
                    &name,
                    payout.net_amount,
                    &payout.payout_method,
                    &payout.reference,
                )
                .await;
        }
        PayoutStatus::Failed => {
            state
                .mailer
                .payout_failed(
                    &contact.email,
                    &name,
                    payout.net_amount,
                    failure_reason.unwrap_or("Unknown error"),
                )
                .await;
        }
        PayoutStatus::Pending => {}
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_direct_single_payload() {
        let body = json!({
            "id": "disb-123",
            "reference_id": "payout-abc",
            "status": "SUCCEEDED",
            "amount": 2940,
        });
        let payload = parse_webhook_payload(&body).unwrap();
        assert_matches!(payload, WebhookPayload::Single(event) => {
            assert_eq!(event.id, "disb-123");
            assert_eq!(event.reference_id, "payout-abc");
            assert_eq!(event.status, "SUCCEEDED");
        });
    }

    #[test]
    fn parses_enveloped_payload() {
        let body = json!({
            "event": "disbursement.completed",
            "data": {
                "id": "disb-123",
                "reference_id": "payout-abc",
                "status": "COMPLETED",
            },
        });
        let payload = parse_webhook_payload(&body).unwrap();
        assert_matches!(payload, WebhookPayload::Single(event) => {
            assert_eq!(event.status, "COMPLETED");
        });
    }

    #[test]
    fn detects_batch_payload() {
        let body = json!({
            "batch_id": "batch-7",
            "disbursements": [
                { "id": "d1", "reference_id": "r1", "status": "SUCCEEDED" },
                { "id": "d2", "reference_id": "r2", "status": "FAILED" },
            ],
        });
        let payload = parse_webhook_payload(&body).unwrap();
        assert_matches!(payload, WebhookPayload::Batch(batch) => {
            assert_eq!(batch.batch_id.as_deref(), Some("batch-7"));
            assert_eq!(batch.disbursements.len(), 2);
        });
    }

    #[test]
    fn rejects_payload_missing_required_fields() {
        let body = json!({ "id": "disb-123", "status": "SUCCEEDED" });
        let err = parse_webhook_payload(&body).unwrap_err();
        assert!(err.contains("reference_id"), "unexpected error: {err}");
    }

    #[test]
    fn rejects_batch_with_malformed_entry() {
        let body = json!({
            "disbursements": [{ "id": "d1" }],
        });
        assert!(parse_webhook_payload(&body).is_err());
    }

    #[test]
    fn metadata_payout_id_accepts_number_and_string() {
        let mut event: DisbursementEvent = serde_json::from_value(json!({
            "id": "d1", "reference_id": "r1", "status": "PENDING",
            "metadata": { "payout_id": 42 },
        }))
        .unwrap();
        assert_eq!(metadata_payout_id(&event), Some(42));

        event.metadata = Some(json!({ "payout_id": "43" }));
        assert_eq!(metadata_payout_id(&event), Some(43));

        event.metadata = Some(json!({ "payout_id": true }));
        assert_eq!(metadata_payout_id(&event), None);

        event.metadata = None;
        assert_eq!(metadata_payout_id(&event), None);
    }
}
