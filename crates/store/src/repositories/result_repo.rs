//! Auction-result repository: terminal records written at retirement.

use anyhow::Result;
use bazaar_core::types::AuctionResult;
use sqlx::PgPool;

use crate::models::AuctionResultRecord;

#[derive(Debug, Clone)]
pub struct ResultRepository {
    pool: PgPool,
}

impl ResultRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the terminal record for a retired auction.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert(&self, result: &AuctionResult) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO auction_results
                (item_id, final_price, winner, bid_count, price_efficiency,
                 market_impact, closed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (item_id) DO NOTHING
            ",
        )
        .bind(result.item_id)
        .bind(result.final_price)
        .bind(result.winner)
        .bind(result.bid_count)
        .bind(result.price_efficiency)
        .bind(result.market_impact)
        .bind(result.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches the most recently closed auctions.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_recent(&self, limit: i64) -> Result<Vec<AuctionResult>> {
        let records = sqlx::query_as::<_, AuctionResultRecord>(
            r"
            SELECT item_id, final_price, winner, bid_count, price_efficiency,
                   market_impact, closed_at
            FROM auction_results
            ORDER BY closed_at DESC
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(AuctionResult::from).collect())
    }
}
