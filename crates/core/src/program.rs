//! Affiliate program configuration types.
//!
//! Both structs are hydrated from the `affiliate_program_config` row (id = 1)
//! at the start of each run; the defaults here apply field-wise when the row
//! or a column is missing, so a half-migrated config table never aborts a
//! sweep.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Settings governing the auto-clearing sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoClearingConfig {
    /// Days a conversion stays refundable after creation.
    pub refund_period_days: i64,
    pub auto_clear_enabled: bool,
    pub fraud_check_enabled: bool,
    /// Minimum age in days before the sweep considers a conversion.
    pub min_days_before_clear: i64,
    /// Maximum age in days; older conversions require manual handling.
    pub max_days_before_clear: i64,
}

impl Default for AutoClearingConfig {
    fn default() -> Self {
        Self {
            refund_period_days: 30,
            auto_clear_enabled: true,
            fraud_check_enabled: true,
            min_days_before_clear: 7,
            max_days_before_clear: 45,
        }
    }
}

/// Settings governing monthly payout eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSettings {
    /// Minimum accumulated cleared amount before an affiliate is paid.
    pub min_payout_threshold: Decimal,
    /// Payout methods the program currently disburses through.
    pub enabled_payout_methods: Vec<String>,
    pub require_verification_for_bank_transfer: bool,
    pub require_verification_for_gcash: bool,
    /// Flat fee rate applied in the payout preview breakdown.
    pub preview_fee_rate: Decimal,
}

impl Default for ProgramSettings {
    fn default() -> Self {
        Self {
            min_payout_threshold: dec!(2000),
            enabled_payout_methods: vec!["gcash".to_owned()],
            require_verification_for_bank_transfer: true,
            require_verification_for_gcash: false,
            preview_fee_rate: dec!(0.02),
        }
    }
}

impl ProgramSettings {
    /// Whether a payout method is currently enabled.
    pub fn method_enabled(&self, method: &str) -> bool {
        self.enabled_payout_methods.iter().any(|m| m == method)
    }
}
