//! Monthly payout preview and rollover balances.
//!
//! Both endpoints are read-only aggregates: they never mutate conversion or
//! payout rows. Actual batch creation consumes the preview's eligible list
//! (see `handlers::batches`).

use std::collections::BTreeMap;

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use payrun_core::eligibility::{self, AffiliateGroup, EligibleAffiliate, IneligibleAffiliate};
use payrun_core::period::{self, PayoutPeriod};
use payrun_core::types::{DbId, Timestamp};
use payrun_db::models::conversion::UnbatchedConversion;
use payrun_db::repositories::{ConversionRepo, ProgramConfigRepo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Monthly preview
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// Payout period as `YYYY-MM`; defaults to the current month.
    pub period: Option<String>,
}

/// Aggregate totals and dates for one preview.
#[derive(Debug, Serialize)]
pub struct PreviewSummary {
    pub total_eligible_affiliates: usize,
    pub total_ineligible_affiliates: usize,
    pub total_payout_amount: Decimal,
    pub total_fee_amount: Decimal,
    pub total_net_amount: Decimal,
    pub total_rollover_amount: Decimal,
    pub payout_period: String,
    pub cutoff_date: String,
    pub processing_date: String,
}

/// Who will and won't get paid this period.
#[derive(Debug, Serialize)]
pub struct MonthlyPayoutPreview {
    pub eligible_affiliates: Vec<EligibleAffiliate>,
    pub ineligible_affiliates: Vec<IneligibleAffiliate>,
    pub summary: PreviewSummary,
}

/// GET /api/v1/admin/payouts/preview?period=YYYY-MM
pub async fn monthly_preview(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> AppResult<Json<DataResponse<MonthlyPayoutPreview>>> {
    let period = match query.period.as_deref() {
        Some(label) => PayoutPeriod::parse(label)?,
        None => PayoutPeriod::containing(Utc::now()),
    };

    let settings = ProgramConfigRepo::program_settings(&state.pool).await?;
    let (start, end) = period.window();
    let rows = ConversionRepo::list_cleared_unbatched_in_period(&state.pool, start, end).await?;

    let groups = group_rows_by_affiliate(rows);
    let processing_date = period.processing_date().to_string();
    let partition = eligibility::partition(groups, &settings, &processing_date);

    let summary = PreviewSummary {
        total_eligible_affiliates: partition.eligible.len(),
        total_ineligible_affiliates: partition.ineligible.len(),
        total_payout_amount: partition.total_payout_amount,
        total_fee_amount: partition.total_fee_amount,
        total_net_amount: partition.total_payout_amount - partition.total_fee_amount,
        total_rollover_amount: partition.total_rollover_amount,
        payout_period: period.label(),
        cutoff_date: period.cutoff_date().to_string(),
        processing_date,
    };

    tracing::debug!(
        period = %summary.payout_period,
        eligible = summary.total_eligible_affiliates,
        ineligible = summary.total_ineligible_affiliates,
        "Monthly payout preview generated"
    );

    Ok(Json(DataResponse {
        data: MonthlyPayoutPreview {
            eligible_affiliates: partition.eligible,
            ineligible_affiliates: partition.ineligible,
            summary,
        },
    }))
}

/// Fold the joined conversion rows into per-affiliate groups, ordered by
/// affiliate ID. Shared with batch creation.
pub(crate) fn group_rows_by_affiliate(rows: Vec<UnbatchedConversion>) -> Vec<AffiliateGroup> {
    let mut groups: BTreeMap<DbId, AffiliateGroup> = BTreeMap::new();

    for row in rows {
        let group = groups.entry(row.affiliate_id).or_insert_with(|| AffiliateGroup {
            affiliate_id: row.affiliate_id,
            affiliate_name: row.display_name(),
            affiliate_email: row.email.clone(),
            total_amount: Decimal::ZERO,
            conversion_count: 0,
            credentials: row.credentials(),
        });
        group.total_amount += row.commission_amount;
        group.conversion_count += 1;
    }

    groups.into_values().collect()
}

// ---------------------------------------------------------------------------
// Rollover balances
// ---------------------------------------------------------------------------

/// One affiliate's not-yet-paid cleared balance across all periods.
#[derive(Debug, Serialize)]
pub struct RolloverBalance {
    pub affiliate_id: DbId,
    pub affiliate_name: String,
    pub affiliate_email: String,
    pub rollover_amount: Decimal,
    pub months_accumulated: i64,
    pub oldest_conversion_date: Timestamp,
}

/// GET /api/v1/admin/payouts/rollover-balances
///
/// Surfaces long-standing unpaid balances regardless of period.
pub async fn rollover_balances(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<RolloverBalance>>>> {
    let rows = ConversionRepo::list_cleared_unbatched_all(&state.pool).await?;

    struct Accum {
        name: String,
        email: String,
        total: Decimal,
        oldest: Timestamp,
        newest: Timestamp,
    }

    let mut balances: BTreeMap<DbId, Accum> = BTreeMap::new();
    for row in rows {
        match balances.get_mut(&row.affiliate_id) {
            Some(accum) => {
                accum.total += row.commission_amount;
                accum.oldest = accum.oldest.min(row.created_at);
                accum.newest = accum.newest.max(row.created_at);
            }
            None => {
                balances.insert(
                    row.affiliate_id,
                    Accum {
                        name: row.display_name(),
                        email: row.email.clone(),
                        total: row.commission_amount,
                        oldest: row.created_at,
                        newest: row.created_at,
                    },
                );
            }
        }
    }

    let data = balances
        .into_iter()
        .map(|(affiliate_id, accum)| RolloverBalance {
            affiliate_id,
            affiliate_name: accum.name,
            affiliate_email: accum.email,
            rollover_amount: accum.total,
            months_accumulated: period::months_accumulated(accum.oldest, accum.newest),
            oldest_conversion_date: accum.oldest,
        })
        .collect();

    Ok(Json(DataResponse { data }))
}
