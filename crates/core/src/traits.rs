use crate::types::{Auction, AuctionResult, Bid, Item, MarketData, PricePoint};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Durable CRUD for items, bids, market statistics, price history, and
/// auction results. All calls run under the caller's deadline (wrapped in
/// `tokio::time::timeout` on the request path) and may fail with a generic
/// store error that the engine wraps with operation context.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>>;
    async fn get_items_by_category(&self, category: &str) -> Result<Vec<Item>>;
    async fn get_active_items(&self) -> Result<Vec<Item>>;
    async fn create_item(&self, item: &Item) -> Result<()>;
    async fn update_item(&self, item: &Item) -> Result<()>;
    /// Soft-cancel: flips the item status rather than deleting the row.
    async fn delete_item(&self, item_id: Uuid) -> Result<()>;

    async fn get_item_bids(&self, item_id: Uuid) -> Result<Vec<Bid>>;
    async fn create_bid(&self, bid: &Bid) -> Result<()>;
    async fn get_winning_bid(&self, item_id: Uuid) -> Result<Option<Bid>>;

    async fn get_market_data(&self, category: &str) -> Result<Option<MarketData>>;
    async fn update_market_data(&self, data: &MarketData) -> Result<()>;
    async fn append_price_point(&self, category: &str, point: &PricePoint) -> Result<()>;
    async fn get_price_history(
        &self,
        category: &str,
        window: Duration,
    ) -> Result<Vec<PricePoint>>;

    async fn create_auction_result(&self, result: &AuctionResult) -> Result<()>;
    async fn get_auction_results(&self, limit: i64) -> Result<Vec<AuctionResult>>;
}

/// Pluggable price-recalculation strategy.
///
/// Implementations are pure with respect to their inputs except the adaptive
/// variant, whose weight state is owned by the algorithm instance (shared
/// across every auction using it) and synchronized independently of any
/// per-auction lock.
pub trait PricingAlgorithm: Send + Sync {
    /// Computes a new price from the auction's current state and market data.
    fn calculate_price(&self, auction: &Auction, market: Option<&MarketData>) -> Result<Decimal>;

    /// Feeds a realized price back into the algorithm. No-op for the
    /// stateless variants.
    fn update_parameters(&self, auction: &Auction, actual_price: Decimal) -> Result<()>;

    fn algorithm_type(&self) -> &'static str;
}
