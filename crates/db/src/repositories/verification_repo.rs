//! Repository for the `admin_verifications` audit table.

use payrun_core::status::CONVERSION_CLEARED;
use payrun_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::verification::{ClearingStats, NewClearingAudit, VERIFICATION_TYPE_AUTO_CLEARING};

/// Writes and aggregates clearing audit entries.
pub struct VerificationRepo;

impl VerificationRepo {
    /// Record one clearing decision.
    ///
    /// `admin_user_id` is NULL: the entry was produced by automated
    /// processing. Callers treat failures as best-effort (log, don't abort).
    pub async fn record_clearing(
        pool: &PgPool,
        audit: &NewClearingAudit,
    ) -> Result<(), sqlx::Error> {
        let metadata = serde_json::json!({
            "affiliate_id": audit.affiliate_id,
            "old_status": audit.old_status,
            "new_status": audit.new_status,
            "days_pending": audit.days_pending,
            "auto_processed": audit.auto_processed,
        });

        sqlx::query(
            "INSERT INTO admin_verifications \
                 (admin_user_id, target_entity_type, target_entity_id, \
                  verification_type, is_verified, notes, metadata) \
             VALUES (NULL, 'conversion', $1, $2, $3, $4, $5)",
        )
        .bind(audit.conversion_id)
        .bind(VERIFICATION_TYPE_AUTO_CLEARING)
        .bind(audit.new_status == CONVERSION_CLEARED)
        .bind(format!(
            "{} ({} days pending)",
            audit.clearing_reason, audit.days_pending
        ))
        .bind(metadata)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Cleared/flagged counts over the audit trail since `since`.
    pub async fn clearing_stats(
        pool: &PgPool,
        since: Timestamp,
    ) -> Result<ClearingStats, sqlx::Error> {
        sqlx::query_as::<_, ClearingStats>(
            "SELECT \
                 COUNT(*) FILTER (WHERE is_verified) AS total_auto_cleared, \
                 COUNT(*) FILTER (WHERE NOT is_verified) AS total_auto_flagged \
             FROM admin_verifications \
             WHERE verification_type = $1 AND verified_at >= $2",
        )
        .bind(VERIFICATION_TYPE_AUTO_CLEARING)
        .bind(since)
        .fetch_one(pool)
        .await
    }
}
