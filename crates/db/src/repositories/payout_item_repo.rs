//! Repository for the `payout_items` table.

use payrun_core::types::DbId;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::payout_item::PayoutItem;

const ITEM_COLUMNS: &str = "id, payout_id, conversion_id, amount, created_at";

/// Provides the payout ↔ conversion join operations.
pub struct PayoutItemRepo;

impl PayoutItemRepo {
    /// Link one conversion's amount to a payout.
    pub async fn create(
        pool: &PgPool,
        payout_id: DbId,
        conversion_id: DbId,
        amount: Decimal,
    ) -> Result<PayoutItem, sqlx::Error> {
        let query = format!(
            "INSERT INTO payout_items (payout_id, conversion_id, amount) \
             VALUES ($1, $2, $3) \
             RETURNING {ITEM_COLUMNS}"
        );
        sqlx::query_as::<_, PayoutItem>(&query)
            .bind(payout_id)
            .bind(conversion_id)
            .bind(amount)
            .fetch_one(pool)
            .await
    }

    /// All items of a payout.
    pub async fn list_for_payout(
        pool: &PgPool,
        payout_id: DbId,
    ) -> Result<Vec<PayoutItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM payout_items WHERE payout_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, PayoutItem>(&query)
            .bind(payout_id)
            .fetch_all(pool)
            .await
    }

    /// The conversion IDs linked to a payout (for the paid cascade).
    pub async fn conversion_ids_for_payout(
        pool: &PgPool,
        payout_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT conversion_id FROM payout_items WHERE payout_id = $1")
            .bind(payout_id)
            .fetch_all(pool)
            .await
    }

    /// Move a failed payout's items onto its retry payout.
    pub async fn reassign(
        pool: &PgPool,
        old_payout_id: DbId,
        new_payout_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payout_items SET payout_id = $2 WHERE payout_id = $1",
        )
        .bind(old_payout_id)
        .bind(new_payout_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
