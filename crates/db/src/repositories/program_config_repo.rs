//! Repository for the single-row `affiliate_program_config` table.

use payrun_core::program::{AutoClearingConfig, ProgramSettings};
use sqlx::PgPool;

use crate::models::program_config::ProgramConfigRow;

const CONFIG_COLUMNS: &str = "\
    id, refund_period_days, auto_clear_enabled, fraud_check_enabled, \
    min_days_before_clear, max_days_before_clear, min_payout_threshold, \
    enabled_payout_methods, require_verification_for_bank_transfer, \
    require_verification_for_gcash, preview_fee_rate, updated_at";

/// Configuration row ID; the table holds exactly one row.
const CONFIG_ROW_ID: i64 = 1;

/// Reads program configuration, substituting defaults when the row is
/// missing. Query errors propagate; a missing row does not.
pub struct ProgramConfigRepo;

impl ProgramConfigRepo {
    /// Fetch the raw configuration row, if present.
    pub async fn fetch(pool: &PgPool) -> Result<Option<ProgramConfigRow>, sqlx::Error> {
        let query =
            format!("SELECT {CONFIG_COLUMNS} FROM affiliate_program_config WHERE id = $1");
        sqlx::query_as::<_, ProgramConfigRow>(&query)
            .bind(CONFIG_ROW_ID)
            .fetch_optional(pool)
            .await
    }

    /// The auto-clearing configuration with defaults applied.
    pub async fn auto_clearing_config(pool: &PgPool) -> Result<AutoClearingConfig, sqlx::Error> {
        Ok(Self::fetch(pool)
            .await?
            .map(|row| row.auto_clearing_config())
            .unwrap_or_default())
    }

    /// The payout program settings with defaults applied.
    pub async fn program_settings(pool: &PgPool) -> Result<ProgramSettings, sqlx::Error> {
        Ok(Self::fetch(pool)
            .await?
            .map(|row| row.program_settings())
            .unwrap_or_default())
    }
}
