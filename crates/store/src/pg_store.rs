//! [`AuctionStore`] implementation backed by the PostgreSQL repositories.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bazaar_core::types::{AuctionResult, Bid, Item, MarketData, PricePoint};
use bazaar_core::AuctionStore;
use chrono::Duration;
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::{BidRepository, ItemRepository, MarketRepository, ResultRepository};

pub struct PgAuctionStore {
    items: ItemRepository,
    bids: BidRepository,
    market: MarketRepository,
    results: ResultRepository,
}

impl PgAuctionStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            items: ItemRepository::new(pool.clone()),
            bids: BidRepository::new(pool.clone()),
            market: MarketRepository::new(pool.clone()),
            results: ResultRepository::new(pool),
        }
    }
}

#[async_trait]
impl AuctionStore for PgAuctionStore {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>> {
        self.items
            .get(item_id)
            .await
            .with_context(|| format!("failed to load item {item_id}"))
    }

    async fn get_items_by_category(&self, category: &str) -> Result<Vec<Item>> {
        self.items
            .get_by_category(category)
            .await
            .with_context(|| format!("failed to load items in category {category:?}"))
    }

    async fn get_active_items(&self) -> Result<Vec<Item>> {
        self.items
            .get_active()
            .await
            .context("failed to load active items")
    }

    async fn create_item(&self, item: &Item) -> Result<()> {
        self.items
            .insert(item)
            .await
            .with_context(|| format!("failed to create item {}", item.id))
    }

    async fn update_item(&self, item: &Item) -> Result<()> {
        self.items
            .update(item)
            .await
            .with_context(|| format!("failed to update item {}", item.id))
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<()> {
        self.items
            .soft_delete(item_id)
            .await
            .with_context(|| format!("failed to cancel item {item_id}"))
    }

    async fn get_item_bids(&self, item_id: Uuid) -> Result<Vec<Bid>> {
        self.bids
            .get_for_item(item_id)
            .await
            .with_context(|| format!("failed to load bids for item {item_id}"))
    }

    async fn create_bid(&self, bid: &Bid) -> Result<()> {
        self.bids
            .insert(bid)
            .await
            .with_context(|| format!("failed to persist bid {} on item {}", bid.id, bid.item_id))
    }

    async fn get_winning_bid(&self, item_id: Uuid) -> Result<Option<Bid>> {
        self.bids
            .get_winning(item_id)
            .await
            .with_context(|| format!("failed to load winning bid for item {item_id}"))
    }

    async fn get_market_data(&self, category: &str) -> Result<Option<MarketData>> {
        self.market
            .get(category)
            .await
            .with_context(|| format!("failed to load market data for {category:?}"))
    }

    async fn update_market_data(&self, data: &MarketData) -> Result<()> {
        self.market
            .upsert(data)
            .await
            .with_context(|| format!("failed to update market data for {:?}", data.category))
    }

    async fn append_price_point(&self, category: &str, point: &PricePoint) -> Result<()> {
        self.market
            .append_price_point(category, point)
            .await
            .with_context(|| format!("failed to append price point for {category:?}"))
    }

    async fn get_price_history(
        &self,
        category: &str,
        window: Duration,
    ) -> Result<Vec<PricePoint>> {
        self.market
            .get_price_history(category, window)
            .await
            .with_context(|| format!("failed to load price history for {category:?}"))
    }

    async fn create_auction_result(&self, result: &AuctionResult) -> Result<()> {
        self.results
            .insert(result)
            .await
            .with_context(|| format!("failed to record result for item {}", result.item_id))
    }

    async fn get_auction_results(&self, limit: i64) -> Result<Vec<AuctionResult>> {
        self.results
            .get_recent(limit)
            .await
            .context("failed to load auction results")
    }
}
