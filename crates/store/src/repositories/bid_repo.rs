//! Bid repository.

use anyhow::Result;
use bazaar_core::types::Bid;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::BidRecord;

#[derive(Debug, Clone)]
pub struct BidRepository {
    pool: PgPool,
}

impl BidRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches an item's bid history in placement order.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_for_item(&self, item_id: Uuid) -> Result<Vec<Bid>> {
        let records = sqlx::query_as::<_, BidRecord>(
            r"
            SELECT id, item_id, bidder_id, amount, placed_at, is_winning
            FROM bids
            WHERE item_id = $1
            ORDER BY placed_at ASC
            ",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Bid::from).collect())
    }

    /// Inserts a bid and, when it is the new winner, demotes the previous
    /// winning row in the same transaction so at most one bid per item is
    /// ever marked winning.
    ///
    /// # Errors
    /// Returns an error if the database transaction fails.
    pub async fn insert(&self, bid: &Bid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if bid.is_winning {
            sqlx::query(
                r"
                UPDATE bids
                SET is_winning = FALSE
                WHERE item_id = $1 AND is_winning = TRUE
                ",
            )
            .bind(bid.item_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r"
            INSERT INTO bids (id, item_id, bidder_id, amount, placed_at, is_winning)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(bid.id)
        .bind(bid.item_id)
        .bind(bid.bidder_id)
        .bind(bid.amount)
        .bind(bid.placed_at)
        .bind(bid.is_winning)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Fetches the currently winning bid for an item, if any.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_winning(&self, item_id: Uuid) -> Result<Option<Bid>> {
        let record = sqlx::query_as::<_, BidRecord>(
            r"
            SELECT id, item_id, bidder_id, amount, placed_at, is_winning
            FROM bids
            WHERE item_id = $1 AND is_winning = TRUE
            LIMIT 1
            ",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Bid::from))
    }
}
