//! Repository for the `affiliates` table.

use payrun_core::types::DbId;
use sqlx::PgPool;

use crate::models::affiliate::{Affiliate, AffiliateContact};

const AFFILIATE_COLUMNS: &str = "\
    id, user_id, commission_tier, account_holder_name, account_number, \
    bank_name, bank_account_verified, gcash_number, gcash_name, \
    gcash_verified, created_at, updated_at";

/// Provides lookups for affiliates and their profile contacts.
pub struct AffiliateRepo;

impl AffiliateRepo {
    /// Find an affiliate by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Affiliate>, sqlx::Error> {
        let query = format!("SELECT {AFFILIATE_COLUMNS} FROM affiliates WHERE id = $1");
        sqlx::query_as::<_, Affiliate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The affiliate's profile name and email (for notifications).
    pub async fn contact_for(
        pool: &PgPool,
        affiliate_id: DbId,
    ) -> Result<Option<AffiliateContact>, sqlx::Error> {
        sqlx::query_as::<_, AffiliateContact>(
            "SELECT p.first_name, p.last_name, p.email \
             FROM affiliates a \
             JOIN unified_profiles p ON p.id = a.user_id \
             WHERE a.id = $1",
        )
        .bind(affiliate_id)
        .fetch_optional(pool)
        .await
    }
}
