//! Affiliate entity model.

use payrun_core::eligibility::PayoutCredentials;
use payrun_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `affiliates` table.
///
/// `bank_name` doubles as the gateway channel code for bank disbursements.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Affiliate {
    pub id: DbId,
    pub user_id: DbId,
    pub commission_tier: String,
    pub account_holder_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account_verified: bool,
    pub gcash_number: Option<String>,
    pub gcash_name: Option<String>,
    pub gcash_verified: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Affiliate {
    /// The affiliate's payout credentials across both channels.
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
}

/// Profile contact details for an affiliate, used by notifications.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AffiliateContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
}

impl AffiliateContact {
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
