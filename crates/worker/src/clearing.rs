//! The auto-clearing sweep.
//!
//! Ages pending conversions through the refund window and transitions each
//! to `cleared` or `flagged`, writing a best-effort audit entry per row.
//! Row-level failures are collected into the run summary and never abort
//! the sweep; only a failure to load the config or the candidate set does.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use payrun_core::clearing::{
    self, ClearingDecision, ClearingWindows, FraudContext, FREQUENCY_WINDOW_DAYS,
};
use payrun_core::status::{CONVERSION_CLEARED, CONVERSION_FLAGGED, CONVERSION_PENDING};
use payrun_core::types::DbId;
use payrun_db::models::conversion::Conversion;
use payrun_db::models::verification::NewClearingAudit;
use payrun_db::repositories::{ConversionRepo, ProgramConfigRepo, VerificationRepo};

/// One cleared conversion in the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct ClearedConversion {
    pub id: DbId,
    pub affiliate_id: DbId,
    pub commission_amount: Decimal,
    pub days_pending: i64,
}

/// Structured result of one sweep. `errors` holds row-level failures; the
/// run itself reports success even when some rows failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClearingRunSummary {
    pub total_processed: usize,
    pub cleared_count: usize,
    pub flagged_count: usize,
    pub errors: Vec<String>,
    pub cleared_conversions: Vec<ClearedConversion>,
}

/// Run one clearing sweep over all eligible pending conversions.
pub async fn run_clearing_sweep(pool: &PgPool) -> ClearingRunSummary {
    let mut summary = ClearingRunSummary::default();

    let config = match ProgramConfigRepo::auto_clearing_config(pool).await {
        Ok(config) => config,
        Err(e) => {
            summary.errors.push(format!("Error loading clearing config: {e}"));
            return summary;
        }
    };

    if !config.auto_clear_enabled {
        summary
            .errors
            .push("Auto-clearing is disabled in configuration".to_owned());
        return summary;
    }

    let now = Utc::now();
    let windows = ClearingWindows::compute(&config, now);
    tracing::debug!(
        refund_cutoff = %windows.refund_cutoff,
        min_clear = %windows.min_clear,
        max_clear = %windows.max_clear,
        "Clearing sweep thresholds computed"
    );

    let candidates = match ConversionRepo::list_clearing_candidates(
        pool,
        windows.refund_cutoff,
        windows.max_clear,
    )
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            summary
                .errors
                .push(format!("Error fetching pending conversions: {e}"));
            return summary;
        }
    };

    if candidates.is_empty() {
        tracing::debug!("No pending conversions eligible for clearing");
        return summary;
    }

    summary.total_processed = candidates.len();
    tracing::info!(count = summary.total_processed, "Processing clearing candidates");

    for conversion in &candidates {
        let days_pending = clearing::days_pending(conversion.created_at, now);

        let fraud_hit = if config.fraud_check_enabled {
            fraud_check(pool, conversion).await
        } else {
            None
        };

        let decision = clearing::decide(days_pending, fraud_hit);
        let (updated, new_status) = match &decision {
            ClearingDecision::Clear { reason } => (
                ConversionRepo::mark_cleared(pool, conversion.id, reason).await,
                CONVERSION_CLEARED,
            ),
            ClearingDecision::Flag { reason } => (
                ConversionRepo::mark_flagged(pool, conversion.id, reason).await,
                CONVERSION_FLAGGED,
            ),
        };

        match updated {
            Ok(true) => {}
            Ok(false) => {
                // Another writer took the row out of pending since selection.
                summary.errors.push(format!(
                    "Conversion {} is no longer pending, skipped",
                    conversion.id
                ));
                continue;
            }
            Err(e) => {
                summary
                    .errors
                    .push(format!("Error updating conversion {}: {e}", conversion.id));
                continue;
            }
        }

        // Audit is best-effort: a failure here must not roll back or fail
        // the status update that already committed.
        let audit = NewClearingAudit {
            conversion_id: conversion.id,
            affiliate_id: conversion.affiliate_id,
            old_status: CONVERSION_PENDING.to_owned(),
            new_status: new_status.to_owned(),
            days_pending,
            clearing_reason: decision.reason().to_owned(),
            auto_processed: true,
        };
        if let Err(e) = VerificationRepo::record_clearing(pool, &audit).await {
            tracing::warn!(
                conversion_id = conversion.id,
                error = %e,
                "Failed to write clearing audit record"
            );
        }

        match decision {
            ClearingDecision::Clear { .. } => {
                summary.cleared_count += 1;
                summary.cleared_conversions.push(ClearedConversion {
                    id: conversion.id,
                    affiliate_id: conversion.affiliate_id,
                    commission_amount: conversion.commission_amount,
                    days_pending,
                });
                tracing::debug!(
                    conversion_id = conversion.id,
                    days_pending,
                    "Conversion auto-cleared"
                );
            }
            ClearingDecision::Flag { reason } => {
                summary.flagged_count += 1;
                tracing::info!(
                    conversion_id = conversion.id,
                    %reason,
                    "Conversion auto-flagged"
                );
            }
        }
    }

    tracing::info!(
        total_processed = summary.total_processed,
        cleared = summary.cleared_count,
        flagged = summary.flagged_count,
        errors = summary.errors.len(),
        "Clearing sweep completed"
    );

    summary
}

/// Evaluate the fraud rules for one candidate.
///
/// Builds the [`FraudContext`] from the database; a query failure fails
/// closed by substituting the system-error hit, so infrastructure trouble
/// flags the conversion instead of clearing it.
async fn fraud_check(pool: &PgPool, conversion: &Conversion) -> Option<String> {
    let duplicate_matches =
        if conversion.customer_id.is_some() || conversion.order_id.is_some() {
            match ConversionRepo::duplicate_match_count(
                pool,
                conversion.id,
                conversion.customer_id.as_deref(),
                conversion.order_id.as_deref(),
            )
            .await
            {
                Ok(count) => count,
                Err(e) => {
                    tracing::error!(conversion_id = conversion.id, error = %e, "Fraud check query failed");
                    return Some(clearing::fraud_system_error_reason());
                }
            }
        } else {
            0
        };

    let since = Utc::now() - Duration::days(FREQUENCY_WINDOW_DAYS);
    let recent_conversion_count = match ConversionRepo::recent_conversion_count(
        pool,
        conversion.affiliate_id,
        since,
        conversion.id,
    )
    .await
    {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(conversion_id = conversion.id, error = %e, "Fraud check query failed");
            return Some(clearing::fraud_system_error_reason());
        }
    };

    let ctx = FraudContext {
        commission_amount: conversion.commission_amount,
        duplicate_matches,
        recent_conversion_count,
    };
    clearing::evaluate_fraud(&ctx)
}
