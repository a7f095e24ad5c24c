//! Audit record models for the `admin_verifications` table.

use payrun_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// Verification type written by the clearing sweep.
pub const VERIFICATION_TYPE_AUTO_CLEARING: &str = "auto_clearing";

/// A row from the `admin_verifications` table.
///
/// `admin_user_id` of `None` means the entry was written by automated
/// processing rather than a human admin.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminVerification {
    pub id: DbId,
    pub admin_user_id: Option<DbId>,
    pub target_entity_type: String,
    pub target_entity_id: DbId,
    pub verification_type: String,
    pub is_verified: bool,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub verified_at: Timestamp,
    pub created_at: Timestamp,
}

/// Fields for one clearing audit entry.
#[derive(Debug, Clone)]
pub struct NewClearingAudit {
    pub conversion_id: DbId,
    pub affiliate_id: DbId,
    pub old_status: String,
    pub new_status: String,
    pub days_pending: i64,
    pub clearing_reason: String,
    pub auto_processed: bool,
}

/// Aggregate counts over the clearing audit trail.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClearingStats {
    pub total_auto_cleared: i64,
    pub total_auto_flagged: i64,
}
