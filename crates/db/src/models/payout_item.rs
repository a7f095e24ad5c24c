//! Payout item join models.

use payrun_core::types::{DbId, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payout_items` table: one conversion's contribution to
/// one payout.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PayoutItem {
    pub id: DbId,
    pub payout_id: DbId,
    pub conversion_id: DbId,
    pub amount: Decimal,
    pub created_at: Timestamp,
}
