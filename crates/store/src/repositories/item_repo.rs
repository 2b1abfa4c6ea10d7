//! Item repository.
//!
//! CRUD for marketplace listings. Deletion is a soft cancel: the row stays,
//! the status flips to `cancelled`.

use anyhow::Result;
use bazaar_core::types::Item;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{status_to_str, ItemRecord};

#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches a single item by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get(&self, item_id: Uuid) -> Result<Option<Item>> {
        let record = sqlx::query_as::<_, ItemRecord>(
            r"
            SELECT id, name, category, rarity, base_price, current_bid,
                   buyout_price, seller_id, status, created_at, end_time
            FROM items
            WHERE id = $1
            ",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(ItemRecord::into_domain).transpose()
    }

    /// Fetches all items in a category, newest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_by_category(&self, category: &str) -> Result<Vec<Item>> {
        let records = sqlx::query_as::<_, ItemRecord>(
            r"
            SELECT id, name, category, rarity, base_price, current_bid,
                   buyout_price, seller_id, status, created_at, end_time
            FROM items
            WHERE category = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(ItemRecord::into_domain).collect()
    }

    /// Fetches every item still in the active lifecycle state.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_active(&self) -> Result<Vec<Item>> {
        let records = sqlx::query_as::<_, ItemRecord>(
            r"
            SELECT id, name, category, rarity, base_price, current_bid,
                   buyout_price, seller_id, status, created_at, end_time
            FROM items
            WHERE status = 'active'
            ORDER BY end_time ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(ItemRecord::into_domain).collect()
    }

    /// Inserts a new listing.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert(&self, item: &Item) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO items
                (id, name, category, rarity, base_price, current_bid,
                 buyout_price, seller_id, status, created_at, end_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(crate::models::rarity_to_str(item.rarity))
        .bind(item.base_price)
        .bind(item.current_bid)
        .bind(item.buyout_price)
        .bind(item.seller_id)
        .bind(status_to_str(item.status))
        .bind(item.created_at)
        .bind(item.end_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates the mutable columns of a listing. `end_time` is intentionally
    /// not part of the update set: it is immutable once written.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn update(&self, item: &Item) -> Result<()> {
        sqlx::query(
            r"
            UPDATE items
            SET current_bid = $2, buyout_price = $3, status = $4
            WHERE id = $1
            ",
        )
        .bind(item.id)
        .bind(item.current_bid)
        .bind(item.buyout_price)
        .bind(status_to_str(item.status))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-cancels a listing.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn soft_delete(&self, item_id: Uuid) -> Result<()> {
        sqlx::query(
            r"
            UPDATE items
            SET status = 'cancelled'
            WHERE id = $1
            ",
        )
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
