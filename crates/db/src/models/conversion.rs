//! Conversion (commission record) models.

use payrun_core::eligibility::PayoutCredentials;
use payrun_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `affiliate_conversions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Conversion {
    pub id: DbId,
    pub affiliate_id: DbId,
    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub gmv: Decimal,
    pub commission_amount: Decimal,
    pub status: String,
    pub payout_id: Option<DbId>,
    pub cleared_at: Option<Timestamp>,
    pub paid_at: Option<Timestamp>,
    pub clearing_reason: Option<String>,
    pub auto_cleared: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A cleared, not-yet-batched conversion joined to its affiliate's payout
/// credentials and profile, as consumed by the eligibility engine.
#[derive(Debug, Clone, FromRow)]
pub struct UnbatchedConversion {
    pub id: DbId,
    pub affiliate_id: DbId,
    pub commission_amount: Decimal,
    pub created_at: Timestamp,
    pub commission_tier: String,
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_verified: bool,
    pub gcash_number: Option<String>,
    pub gcash_name: Option<String>,
    pub gcash_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}

impl UnbatchedConversion {
    /// The joined affiliate's payout credentials.
    pub fn credentials(&self) -> PayoutCredentials {
        PayoutCredentials {
            account_holder_name: self.account_holder_name.clone(),
            account_number: self.account_number.clone(),
            bank_name: self.bank_name.clone(),
            bank_account_verified: self.bank_account_verified,
            gcash_number: self.gcash_number.clone(),
            gcash_name: self.gcash_name.clone(),
            gcash_verified: self.gcash_verified,
        }
    }

    /// "First Last" display name, trimmed when either part is missing.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_owned()
    }
}
