//! Payout (disbursement record) models.

use payrun_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `affiliate_payouts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payout {
    pub id: DbId,
    pub affiliate_id: DbId,
    pub batch_id: Option<String>,
    /// Gross amount: the sum of the constituent payout item amounts.
    pub amount: Decimal,
    pub fee_amount: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub payout_method: String,
    /// Our unique reference, sent to the gateway as its `reference_id`.
    pub reference: String,
    pub gateway_disbursement_id: Option<String>,
    pub processing_notes: Option<String>,
    /// Set once on gateway success; never overwritten.
    pub processed_at: Option<Timestamp>,
    pub failed_at: Option<Timestamp>,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields for inserting a new pending payout.
#[derive(Debug, Clone)]
pub struct NewPayout {
    pub affiliate_id: DbId,
    pub batch_id: Option<String>,
    pub amount: Decimal,
    pub fee_amount: Decimal,
    pub net_amount: Decimal,
    pub payout_method: String,
    pub reference: String,
}
