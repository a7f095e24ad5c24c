//! Payout batch creation, dispatch, and retry.
//!
//! Batch creation consumes the eligibility preview's eligible side: one
//! pending payout per affiliate plus payout items stamping `payout_id` onto
//! the contributing conversions. Dispatch hands pending payouts to the
//! gateway one at a time; the webhook handler reconciles the results.
//!
//! Creation is deliberately not wrapped in one large transaction: each
//! affiliate is processed independently and failures land in the result's
//! error list, mirroring the run-summary pattern of the clearing sweep.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use payrun_core::eligibility::{self, EligibleAffiliate, PayoutMethod};
use payrun_core::error::CoreError;
use payrun_core::fees;
use payrun_core::period::PayoutPeriod;
use payrun_core::status::PayoutStatus;
use payrun_core::types::DbId;
use payrun_db::models::affiliate::Affiliate;
use payrun_db::models::payout::{NewPayout, Payout};
use payrun_db::repositories::{
    AffiliateRepo, ConversionRepo, PayoutItemRepo, PayoutRepo, ProgramConfigRepo,
};

use crate::error::{AppError, AppResult};
use crate::gateway::DisbursementRequest;
use crate::response::DataResponse;
use crate::state::AppState;

use super::payout_preview::group_rows_by_affiliate;

// ---------------------------------------------------------------------------
// Batch creation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBatchRequest {
    /// Payout period as `YYYY-MM`; defaults to the current month.
    pub period: Option<String>,
}

/// One payout created by a batch run.
#[derive(Debug, Serialize)]
pub struct CreatedPayout {
    pub payout_id: DbId,
    pub affiliate_id: DbId,
    pub amount: Decimal,
    pub fee_amount: Decimal,
    pub net_amount: Decimal,
    pub conversion_count: usize,
}

/// Structured result of one batch creation run.
#[derive(Debug, Serialize)]
pub struct BatchCreateResult {
    pub batch_id: String,
    pub payouts: Vec<CreatedPayout>,
    pub errors: Vec<String>,
}

/// POST /api/v1/admin/payouts/batches
pub async fn create_batch(
    State(state): State<AppState>,
    Json(request): Json<CreateBatchRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<BatchCreateResult>>)> {
    let period = match request.period.as_deref() {
        Some(label) => PayoutPeriod::parse(label)?,
        None => PayoutPeriod::containing(Utc::now()),
    };
    let settings = ProgramConfigRepo::program_settings(&state.pool).await?;
    let (start, end) = period.window();

    let rows = ConversionRepo::list_cleared_unbatched_in_period(&state.pool, start, end).await?;
    let groups = group_rows_by_affiliate(rows);
    let processing_date = period.processing_date().to_string();
    let partition = eligibility::partition(groups, &settings, &processing_date);

    let batch_id = Uuid::new_v4().to_string();
    let mut result = BatchCreateResult {
        batch_id: batch_id.clone(),
        payouts: Vec::new(),
        errors: Vec::new(),
    };

    for eligible in &partition.eligible {
        match create_payout_for_affiliate(&state, eligible, &batch_id, start, end).await {
            Ok(created) => result.payouts.push(created),
            Err(e) => {
                result.errors.push(format!(
                    "Affiliate {}: {e}",
                    eligible.affiliate_id
                ));
            }
        }
    }

    tracing::info!(
        batch_id = %result.batch_id,
        payouts = result.payouts.len(),
        errors = result.errors.len(),
        period = %period.label(),
        "Payout batch created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: result })))
}

/// Build one pending payout for one eligible affiliate.
async fn create_payout_for_affiliate(
    state: &AppState,
    eligible: &EligibleAffiliate,
    batch_id: &str,
    start: payrun_core::types::Timestamp,
    end: payrun_core::types::Timestamp,
) -> Result<CreatedPayout, AppError> {
    let conversions = ConversionRepo::list_cleared_unbatched_for_affiliate(
        &state.pool,
        eligible.affiliate_id,
        start,
        end,
    )
    .await?;
    if conversions.is_empty() {
        return Err(AppError::Core(CoreError::Conflict(
            "no unbatched cleared conversions remain for this affiliate".to_owned(),
        )));
    }

    let affiliate = AffiliateRepo::find_by_id(&state.pool, eligible.affiliate_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Affiliate",
            id: eligible.affiliate_id,
        }))?;

    // Recompute the gross from the rows being batched; the preview may be
    // stale by the time the batch runs.
    let gross: Decimal = conversions.iter().map(|c| c.commission_amount).sum();
    let breakdown = fees::calculate_payout_fees(
        gross,
        eligible.payout_method.as_str(),
        Some(&affiliate.commission_tier),
    );

    let payout = PayoutRepo::create(
        &state.pool,
        &NewPayout {
            affiliate_id: eligible.affiliate_id,
            batch_id: Some(batch_id.to_owned()),
            amount: gross,
            fee_amount: breakdown.total_fees,
            net_amount: breakdown.net_amount,
            payout_method: eligible.payout_method.as_str().to_owned(),
            reference: format!("payout-{}", Uuid::new_v4()),
        },
    )
    .await?;

    for conversion in &conversions {
        PayoutItemRepo::create(
            &state.pool,
            payout.id,
            conversion.id,
            conversion.commission_amount,
        )
        .await?;
    }

    let conversion_ids: Vec<DbId> = conversions.iter().map(|c| c.id).collect();
    let assigned =
        ConversionRepo::assign_to_payout(&state.pool, &conversion_ids, payout.id).await?;
    if assigned != conversion_ids.len() as u64 {
        tracing::warn!(
            payout_id = payout.id,
            expected = conversion_ids.len(),
            assigned,
            "Some conversions were claimed by another batch during creation"
        );
    }

    Ok(CreatedPayout {
        payout_id: payout.id,
        affiliate_id: eligible.affiliate_id,
        amount: payout.amount,
        fee_amount: payout.fee_amount,
        net_amount: payout.net_amount,
        conversion_count: conversion_ids.len(),
    })
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Structured result of dispatching one batch to the gateway.
#[derive(Debug, Serialize)]
pub struct DispatchResult {
    pub batch_id: String,
    pub dispatched: usize,
    pub errors: Vec<String>,
}

/// POST /api/v1/admin/payouts/batches/{batch_id}/dispatch
///
/// Send each pending payout in the batch to the gateway and move it to
/// `processing`. Per-payout failures are collected; the rest continue.
pub async fn dispatch_batch(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> AppResult<Json<DataResponse<DispatchResult>>> {
    let payouts = PayoutRepo::list_pending_in_batch(&state.pool, &batch_id).await?;

    let mut result = DispatchResult {
        batch_id,
        dispatched: 0,
        errors: Vec::new(),
    };

    for payout in &payouts {
        match dispatch_payout(&state, payout).await {
            Ok(()) => result.dispatched += 1,
            Err(e) => {
                tracing::error!(payout_id = payout.id, error = %e, "Dispatch failed");
                result.errors.push(format!("Payout {}: {e}", payout.id));
            }
        }
    }

    tracing::info!(
        batch_id = %result.batch_id,
        dispatched = result.dispatched,
        errors = result.errors.len(),
        "Batch dispatch completed"
    );

    Ok(Json(DataResponse { data: result }))
}

async fn dispatch_payout(state: &AppState, payout: &Payout) -> Result<(), AppError> {
    let affiliate = AffiliateRepo::find_by_id(&state.pool, payout.affiliate_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Affiliate",
            id: payout.affiliate_id,
        }))?;

    let request = disbursement_request_for(state, payout, &affiliate)?;
    let response = state
        .gateway
        .create_disbursement(&request)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    PayoutRepo::mark_processing(&state.pool, payout.id, &response.id).await?;
    Ok(())
}

/// Map a payout and its affiliate's credentials onto a gateway request.
fn disbursement_request_for(
    state: &AppState,
    payout: &Payout,
    affiliate: &Affiliate,
) -> Result<DisbursementRequest, AppError> {
    let missing = |what: &str| {
        AppError::Core(CoreError::Conflict(format!(
            "affiliate is missing {what} for method {}",
            payout.payout_method
        )))
    };

    let (channel_code, account_name, account_number) =
        if payout.payout_method == PayoutMethod::BankTransfer.as_str() {
            (
                // bank_name holds the gateway channel code for bank payouts.
                affiliate.bank_name.clone().ok_or_else(|| missing("bank name"))?,
                affiliate
                    .account_holder_name
                    .clone()
                    .ok_or_else(|| missing("account holder name"))?,
                affiliate
                    .account_number
                    .clone()
                    .ok_or_else(|| missing("account number"))?,
            )
        } else {
            (
                "GCASH".to_owned(),
                affiliate.gcash_name.clone().ok_or_else(|| missing("e-wallet name"))?,
                affiliate
                    .gcash_number
                    .clone()
                    .ok_or_else(|| missing("e-wallet number"))?,
            )
        };

    Ok(DisbursementRequest {
        reference_id: payout.reference.clone(),
        amount: payout.net_amount,
        currency: state.config.gateway.currency.clone(),
        channel_code,
        account_name,
        account_number,
        description: Some(format!(
            "Affiliate commission payout for affiliate {}",
            payout.affiliate_id
        )),
    })
}

// ---------------------------------------------------------------------------
// Retry
// ---------------------------------------------------------------------------

/// POST /api/v1/admin/payouts/{payout_id}/retry
///
/// Create a fresh pending payout from a failed one and relink its items and
/// conversions. The failed row keeps its terminal status.
pub async fn retry_failed_payout(
    State(state): State<AppState>,
    Path(payout_id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<Payout>>)> {
    let failed = PayoutRepo::find_by_id(&state.pool, payout_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Payout",
            id: payout_id,
        }))?;

    if PayoutStatus::parse(&failed.status)? != PayoutStatus::Failed {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "only failed payouts can be retried, payout {payout_id} is '{}'",
            failed.status
        ))));
    }

    let retry = PayoutRepo::create(
        &state.pool,
        &NewPayout {
            affiliate_id: failed.affiliate_id,
            batch_id: failed.batch_id.clone(),
            amount: failed.amount,
            fee_amount: failed.fee_amount,
            net_amount: failed.net_amount,
            payout_method: failed.payout_method.clone(),
            reference: format!("payout-{}", Uuid::new_v4()),
        },
    )
    .await?;

    let items = PayoutItemRepo::reassign(&state.pool, failed.id, retry.id).await?;
    let conversions = ConversionRepo::reassign_payout(&state.pool, failed.id, retry.id).await?;

    tracing::info!(
        failed_payout_id = failed.id,
        retry_payout_id = retry.id,
        items,
        conversions,
        "Failed payout retried as new pending payout"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: retry })))
}
