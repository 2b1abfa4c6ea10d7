//! Market statistics and price-history repository.

use anyhow::Result;
use bazaar_core::types::{MarketData, PricePoint};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::models::{source_to_str, MarketDataRecord, PricePointRecord};

#[derive(Debug, Clone)]
pub struct MarketRepository {
    pool: PgPool,
}

impl MarketRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches the per-category aggregate, if one has been computed.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(&self, category: &str) -> Result<Option<MarketData>> {
        let record = sqlx::query_as::<_, MarketDataRecord>(
            r"
            SELECT category, average_price, median_price, price_std_dev,
                   supply_velocity, demand_velocity, price_elasticity,
                   saturation, updated_at
            FROM market_data
            WHERE category = $1
            ",
        )
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(MarketData::from))
    }

    /// Upserts the per-category aggregate.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn upsert(&self, data: &MarketData) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO market_data
                (category, average_price, median_price, price_std_dev,
                 supply_velocity, demand_velocity, price_elasticity,
                 saturation, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (category) DO UPDATE
            SET average_price = EXCLUDED.average_price,
                median_price = EXCLUDED.median_price,
                price_std_dev = EXCLUDED.price_std_dev,
                supply_velocity = EXCLUDED.supply_velocity,
                demand_velocity = EXCLUDED.demand_velocity,
                price_elasticity = EXCLUDED.price_elasticity,
                saturation = EXCLUDED.saturation,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(&data.category)
        .bind(data.average_price)
        .bind(data.median_price)
        .bind(data.price_std_dev)
        .bind(data.supply_velocity)
        .bind(data.demand_velocity)
        .bind(data.price_elasticity)
        .bind(data.saturation)
        .bind(data.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Appends one point to a category's price series.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn append_price_point(&self, category: &str, point: &PricePoint) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO price_history (category, timestamp, price, volume, source)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(category)
        .bind(point.timestamp)
        .bind(point.price)
        .bind(point.volume)
        .bind(source_to_str(point.source))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a category's price series within the trailing window,
    /// oldest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_price_history(
        &self,
        category: &str,
        window: Duration,
    ) -> Result<Vec<PricePoint>> {
        let cutoff = Utc::now() - window;
        let records = sqlx::query_as::<_, PricePointRecord>(
            r"
            SELECT timestamp, price, volume, source
            FROM price_history
            WHERE category = $1 AND timestamp >= $2
            ORDER BY timestamp ASC
            ",
        )
        .bind(category)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        records
            .into_iter()
            .map(PricePointRecord::into_domain)
            .collect()
    }
}
