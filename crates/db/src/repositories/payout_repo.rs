//! Repository for the `affiliate_payouts` table.

use payrun_core::types::DbId;
use sqlx::PgPool;

use crate::models::payout::{NewPayout, Payout};

const PAYOUT_COLUMNS: &str = "\
    id, affiliate_id, batch_id, amount, fee_amount, net_amount, status, \
    payout_method, reference, gateway_disbursement_id, processing_notes, \
    processed_at, failed_at, failure_reason, created_at, updated_at";

/// Provides CRUD and webhook reconciliation queries for payouts.
pub struct PayoutRepo;

impl PayoutRepo {
    /// Insert a new payout with status `pending`.
    pub async fn create(pool: &PgPool, payout: &NewPayout) -> Result<Payout, sqlx::Error> {
        let query = format!(
            "INSERT INTO affiliate_payouts \
                 (affiliate_id, batch_id, amount, fee_amount, net_amount, \
                  payout_method, reference) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PAYOUT_COLUMNS}"
        );
        sqlx::query_as::<_, Payout>(&query)
            .bind(payout.affiliate_id)
            .bind(payout.batch_id.as_deref())
            .bind(payout.amount)
            .bind(payout.fee_amount)
            .bind(payout.net_amount)
            .bind(&payout.payout_method)
            .bind(&payout.reference)
            .fetch_one(pool)
            .await
    }

    /// Find a payout by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payout>, sqlx::Error> {
        let query = format!("SELECT {PAYOUT_COLUMNS} FROM affiliate_payouts WHERE id = $1");
        sqlx::query_as::<_, Payout>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a payout by our unique gateway reference.
    pub async fn find_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<Payout>, sqlx::Error> {
        let query = format!("SELECT {PAYOUT_COLUMNS} FROM affiliate_payouts WHERE reference = $1");
        sqlx::query_as::<_, Payout>(&query)
            .bind(reference)
            .fetch_optional(pool)
            .await
    }

    /// Find a payout by the gateway's disbursement ID.
    pub async fn find_by_gateway_id(
        pool: &PgPool,
        gateway_disbursement_id: &str,
    ) -> Result<Option<Payout>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYOUT_COLUMNS} FROM affiliate_payouts \
             WHERE gateway_disbursement_id = $1"
        );
        sqlx::query_as::<_, Payout>(&query)
            .bind(gateway_disbursement_id)
            .fetch_optional(pool)
            .await
    }

    /// Pending payouts belonging to a batch, ready for dispatch.
    pub async fn list_pending_in_batch(
        pool: &PgPool,
        batch_id: &str,
    ) -> Result<Vec<Payout>, sqlx::Error> {
        let query = format!(
            "SELECT {PAYOUT_COLUMNS} FROM affiliate_payouts \
             WHERE batch_id = $1 AND status = 'pending' \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, Payout>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Move a pending payout to `processing` after the gateway accepted it.
    pub async fn mark_processing(
        pool: &PgPool,
        id: DbId,
        gateway_disbursement_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE affiliate_payouts SET \
                 status = 'processing', \
                 gateway_disbursement_id = $2, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(gateway_disbursement_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply a webhook status transition.
    ///
    /// `processed_at` is set only on success and never overwritten once set;
    /// `failed_at`/`failure_reason` only on failure. The caller has already
    /// established that `status` differs from the stored value.
    pub async fn apply_webhook_update(
        pool: &PgPool,
        id: DbId,
        status: &str,
        gateway_disbursement_id: &str,
        processing_notes: &str,
        succeeded: bool,
        failure_reason: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE affiliate_payouts SET \
                 status = $2, \
                 gateway_disbursement_id = $3, \
                 processing_notes = $4, \
                 processed_at = CASE WHEN $5 THEN COALESCE(processed_at, NOW()) \
                                     ELSE processed_at END, \
                 failed_at = CASE WHEN $2 = 'failed' THEN NOW() ELSE failed_at END, \
                 failure_reason = COALESCE($6, failure_reason), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(gateway_disbursement_id)
        .bind(processing_notes)
        .bind(succeeded)
        .bind(failure_reason)
        .execute(pool)
        .await?;
        Ok(())
    }
}
