//! Program configuration row model.

use payrun_core::program::{AutoClearingConfig, ProgramSettings};
use payrun_core::types::Timestamp;
use rust_decimal::Decimal;
use sqlx::FromRow;

/// The `affiliate_program_config` row (id = 1). Every settings column is
/// nullable so a partially-populated row still hydrates cleanly; defaults
/// are substituted field-wise in the conversion methods.
#[derive(Debug, Clone, FromRow)]
pub struct ProgramConfigRow {
    pub id: i64,
    pub refund_period_days: Option<i32>,
    pub auto_clear_enabled: Option<bool>,
    pub fraud_check_enabled: Option<bool>,
    pub min_days_before_clear: Option<i32>,
    pub max_days_before_clear: Option<i32>,
    pub min_payout_threshold: Option<Decimal>,
    pub enabled_payout_methods: Option<serde_json::Value>,
    pub require_verification_for_bank_transfer: Option<bool>,
    pub require_verification_for_gcash: Option<bool>,
    pub preview_fee_rate: Option<Decimal>,
    pub updated_at: Timestamp,
}

impl ProgramConfigRow {
    /// Hydrate the clearing config, defaulting missing fields.
    pub fn auto_clearing_config(&self) -> AutoClearingConfig {
        let defaults = AutoClearingConfig::default();
        AutoClearingConfig {
            refund_period_days: self
                .refund_period_days
                .map(i64::from)
                .unwrap_or(defaults.refund_period_days),
            auto_clear_enabled: self.auto_clear_enabled.unwrap_or(defaults.auto_clear_enabled),
            fraud_check_enabled: self
                .fraud_check_enabled
                .unwrap_or(defaults.fraud_check_enabled),
            min_days_before_clear: self
                .min_days_before_clear
                .map(i64::from)
                .unwrap_or(defaults.min_days_before_clear),
            max_days_before_clear: self
                .max_days_before_clear
                .map(i64::from)
                .unwrap_or(defaults.max_days_before_clear),
        }
    }

    /// Hydrate the payout settings, defaulting missing fields.
    pub fn program_settings(&self) -> ProgramSettings {
        let defaults = ProgramSettings::default();
        let enabled_payout_methods = self
            .enabled_payout_methods
            .as_ref()
            .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok())
            .unwrap_or(defaults.enabled_payout_methods);

        ProgramSettings {
            min_payout_threshold: self
                .min_payout_threshold
                .unwrap_or(defaults.min_payout_threshold),
            enabled_payout_methods,
            require_verification_for_bank_transfer: self
                .require_verification_for_bank_transfer
                .unwrap_or(defaults.require_verification_for_bank_transfer),
            require_verification_for_gcash: self
                .require_verification_for_gcash
                .unwrap_or(defaults.require_verification_for_gcash),
            preview_fee_rate: self.preview_fee_rate.unwrap_or(defaults.preview_fee_rate),
        }
    }
}
