//! Repository for the `affiliate_conversions` table.
//!
//! Every mutating query carries its status precondition in the WHERE clause
//! (`status = 'pending'`, `status = 'cleared' AND payout_id IS NULL`, ...).
//! The clearing sweep and webhook reconciliation write to disjoint
//! partitions of this table because of those predicates; keep them intact
//! when changing any query here.

use payrun_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::conversion::{Conversion, UnbatchedConversion};

const CONVERSION_COLUMNS: &str = "\
    id, affiliate_id, order_id, customer_id, gmv, commission_amount, status, \
    payout_id, cleared_at, paid_at, clearing_reason, auto_cleared, \
    created_at, updated_at";

const UNBATCHED_COLUMNS: &str = "\
    c.id, c.affiliate_id, c.commission_amount, c.created_at, \
    a.commission_tier, a.account_holder_name, a.account_number, a.bank_name, \
    a.bank_account_verified, a.gcash_number, a.gcash_name, a.gcash_verified, \
    p.first_name, p.last_name, p.email";

const UNBATCHED_JOINS: &str = "\
    FROM affiliate_conversions c \
    JOIN affiliates a ON a.id = c.affiliate_id \
    JOIN unified_profiles p ON p.id = a.user_id \
    WHERE c.status = 'cleared' AND c.payout_id IS NULL";

/// Provides queries and status transitions for conversions.
pub struct ConversionRepo;

impl ConversionRepo {
    /// Find a conversion by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Conversion>, sqlx::Error> {
        let query = format!("SELECT {CONVERSION_COLUMNS} FROM affiliate_conversions WHERE id = $1");
        sqlx::query_as::<_, Conversion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Clearing sweep
    // -----------------------------------------------------------------------

    /// Pending conversions whose refund period has expired but which are not
    /// too old for automatic handling, oldest first.
    pub async fn list_clearing_candidates(
        pool: &PgPool,
        refund_cutoff: Timestamp,
        max_clear: Timestamp,
    ) -> Result<Vec<Conversion>, sqlx::Error> {
        let query = format!(
            "SELECT {CONVERSION_COLUMNS} FROM affiliate_conversions \
             WHERE status = 'pending' \
               AND created_at <= $1 \
               AND created_at >= $2 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Conversion>(&query)
            .bind(refund_cutoff)
            .bind(max_clear)
            .fetch_all(pool)
            .await
    }

    /// Other conversions sharing this conversion's customer or order.
    pub async fn duplicate_match_count(
        pool: &PgPool,
        conversion_id: DbId,
        customer_id: Option<&str>,
        order_id: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM affiliate_conversions \
             WHERE id <> $1 \
               AND ((customer_id = $2 AND $2 IS NOT NULL) \
                 OR (order_id = $3 AND $3 IS NOT NULL))",
        )
        .bind(conversion_id)
        .bind(customer_id)
        .bind(order_id)
        .fetch_one(pool)
        .await
    }

    /// Conversions by one affiliate created since `since`, excluding the
    /// conversion under evaluation.
    pub async fn recent_conversion_count(
        pool: &PgPool,
        affiliate_id: DbId,
        since: Timestamp,
        exclude_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM affiliate_conversions \
             WHERE affiliate_id = $1 AND created_at >= $2 AND id <> $3",
        )
        .bind(affiliate_id)
        .bind(since)
        .bind(exclude_id)
        .fetch_one(pool)
        .await
    }

    /// Transition a pending conversion to `cleared`.
    ///
    /// Returns false when the row was not pending anymore, which keeps
    /// repeated sweeps idempotent.
    pub async fn mark_cleared(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE affiliate_conversions SET \
                 status = 'cleared', \
                 cleared_at = NOW(), \
                 clearing_reason = $2, \
                 auto_cleared = TRUE, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Transition a pending conversion to `flagged`. `cleared_at` stays NULL.
    pub async fn mark_flagged(
        pool: &PgPool,
        id: DbId,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE affiliate_conversions SET \
                 status = 'flagged', \
                 clearing_reason = $2, \
                 auto_cleared = TRUE, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Eligibility / batching
    // -----------------------------------------------------------------------

    /// Cleared, never-batched conversions inside `[start, end)`, joined to
    /// affiliate credentials and profile.
    pub async fn list_cleared_unbatched_in_period(
        pool: &PgPool,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<UnbatchedConversion>, sqlx::Error> {
        let query = format!(
            "SELECT {UNBATCHED_COLUMNS} {UNBATCHED_JOINS} \
               AND c.created_at >= $1 AND c.created_at < $2 \
             ORDER BY c.created_at ASC"
        );
        sqlx::query_as::<_, UnbatchedConversion>(&query)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// All cleared, never-batched conversions regardless of period (rollover
    /// balance reporting).
    pub async fn list_cleared_unbatched_all(
        pool: &PgPool,
    ) -> Result<Vec<UnbatchedConversion>, sqlx::Error> {
        let query =
            format!("SELECT {UNBATCHED_COLUMNS} {UNBATCHED_JOINS} ORDER BY c.created_at ASC");
        sqlx::query_as::<_, UnbatchedConversion>(&query)
            .fetch_all(pool)
            .await
    }

    /// Cleared, never-batched conversions for one affiliate inside
    /// `[start, end)` — the rows a new payout will be built from.
    pub async fn list_cleared_unbatched_for_affiliate(
        pool: &PgPool,
        affiliate_id: DbId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Conversion>, sqlx::Error> {
        let query = format!(
            "SELECT {CONVERSION_COLUMNS} FROM affiliate_conversions \
             WHERE status = 'cleared' AND payout_id IS NULL \
               AND affiliate_id = $1 \
               AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Conversion>(&query)
            .bind(affiliate_id)
            .bind(start)
            .bind(end)
            .fetch_all(pool)
            .await
    }

    /// Stamp `payout_id` on cleared, unbatched conversions.
    ///
    /// The predicate rejects rows another batch claimed in the meantime;
    /// the returned count lets the caller detect that.
    pub async fn assign_to_payout(
        pool: &PgPool,
        conversion_ids: &[DbId],
        payout_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE affiliate_conversions SET \
                 payout_id = $1, \
                 updated_at = NOW() \
             WHERE id = ANY($2) AND status = 'cleared' AND payout_id IS NULL",
        )
        .bind(payout_id)
        .bind(conversion_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move conversions from a failed payout onto its retry payout.
    pub async fn reassign_payout(
        pool: &PgPool,
        old_payout_id: DbId,
        new_payout_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE affiliate_conversions SET \
                 payout_id = $2, \
                 updated_at = NOW() \
             WHERE payout_id = $1",
        )
        .bind(old_payout_id)
        .bind(new_payout_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    // -----------------------------------------------------------------------
    // Paid cascade
    // -----------------------------------------------------------------------

    /// Transition cleared conversions to `paid` after their payout was sent.
    ///
    /// The `status = 'cleared'` guard makes webhook replays a no-op here.
    pub async fn mark_paid_many(
        pool: &PgPool,
        conversion_ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE affiliate_conversions SET \
                 status = 'paid', \
                 paid_at = NOW(), \
                 updated_at = NOW() \
             WHERE id = ANY($1) AND status = 'cleared'",
        )
        .bind(conversion_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
