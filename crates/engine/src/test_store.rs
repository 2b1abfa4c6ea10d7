//! In-memory [`AuctionStore`] with failure injection, for engine tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use bazaar_core::types::{
    AuctionResult, Bid, Item, ItemStatus, MarketData, PricePoint, Rarity,
};
use bazaar_core::AuctionStore;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    items: HashMap<Uuid, Item>,
    bids: HashMap<Uuid, Vec<Bid>>,
    market: HashMap<String, MarketData>,
    history: HashMap<String, Vec<PricePoint>>,
    results: Vec<AuctionResult>,
    failing_categories: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_bids: AtomicBool,
    bid_write_delay: Mutex<Option<std::time::Duration>>,
    item_read_delay: Mutex<Option<std::time::Duration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent bid write fail.
    pub fn fail_bid_writes(&self, fail: bool) {
        self.fail_bids.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent bid write stall for `delay` before applying.
    pub fn delay_bid_writes(&self, delay: std::time::Duration) {
        *self.bid_write_delay.lock().unwrap() = Some(delay);
    }

    /// Makes every subsequent item read stall for `delay` before returning.
    pub fn delay_item_reads(&self, delay: std::time::Duration) {
        *self.item_read_delay.lock().unwrap() = Some(delay);
    }

    /// Makes price-point appends for one category fail.
    pub fn fail_price_points_for(&self, category: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_categories
            .insert(category.to_string());
    }

    /// Inserts an active item directly. A negative duration yields an
    /// already-ended auction.
    pub fn seed_item(
        &self,
        name: &str,
        category: &str,
        base_price: Decimal,
        duration_hours: i64,
    ) -> Uuid {
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.to_string(),
            rarity: Rarity::Common,
            base_price,
            current_bid: Decimal::ZERO,
            buyout_price: None,
            seller_id: Uuid::new_v4(),
            status: ItemStatus::Active,
            created_at: now - Duration::hours(1),
            end_time: now + Duration::hours(duration_hours),
        };
        let id = item.id;
        self.inner.lock().unwrap().items.insert(id, item);
        id
    }

    pub fn seed_bid(&self, item_id: Uuid, amount: Decimal, is_winning: bool) {
        let bid = Bid {
            id: Uuid::new_v4(),
            item_id,
            bidder_id: Uuid::new_v4(),
            amount,
            placed_at: Utc::now(),
            is_winning,
        };
        self.inner
            .lock()
            .unwrap()
            .bids
            .entry(item_id)
            .or_default()
            .push(bid);
    }

    pub fn item(&self, item_id: Uuid) -> Option<Item> {
        self.inner.lock().unwrap().items.get(&item_id).cloned()
    }

    pub fn bids_for(&self, item_id: Uuid) -> Vec<Bid> {
        self.inner
            .lock()
            .unwrap()
            .bids
            .get(&item_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn history_for(&self, category: &str) -> Vec<PricePoint> {
        self.inner
            .lock()
            .unwrap()
            .history
            .get(category)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn get_item(&self, item_id: Uuid) -> Result<Option<Item>> {
        let delay = *self.item_read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.inner.lock().unwrap().items.get(&item_id).cloned())
    }

    async fn get_items_by_category(&self, category: &str) -> Result<Vec<Item>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .items
            .values()
            .filter(|i| i.category == category)
            .cloned()
            .collect())
    }

    async fn get_active_items(&self) -> Result<Vec<Item>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .items
            .values()
            .filter(|i| i.status == ItemStatus::Active)
            .cloned()
            .collect())
    }

    async fn create_item(&self, item: &Item) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .items
            .insert(item.id, item.clone());
        Ok(())
    }

    async fn update_item(&self, item: &Item) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .items
            .insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.items.get_mut(&item_id) {
            Some(item) => {
                item.status = ItemStatus::Cancelled;
                Ok(())
            }
            None => bail!("no such item"),
        }
    }

    async fn get_item_bids(&self, item_id: Uuid) -> Result<Vec<Bid>> {
        Ok(self.bids_for(item_id))
    }

    async fn create_bid(&self, bid: &Bid) -> Result<()> {
        if self.fail_bids.load(Ordering::SeqCst) {
            bail!("injected bid write failure");
        }
        let delay = *self.bid_write_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock().unwrap();
        let bids = inner.bids.entry(bid.item_id).or_default();
        for prior in bids.iter_mut() {
            prior.is_winning = false;
        }
        bids.push(bid.clone());
        Ok(())
    }

    async fn get_winning_bid(&self, item_id: Uuid) -> Result<Option<Bid>> {
        Ok(self
            .bids_for(item_id)
            .into_iter()
            .find(|b| b.is_winning))
    }

    async fn get_market_data(&self, category: &str) -> Result<Option<MarketData>> {
        Ok(self.inner.lock().unwrap().market.get(category).cloned())
    }

    async fn update_market_data(&self, data: &MarketData) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .market
            .insert(data.category.clone(), data.clone());
        Ok(())
    }

    async fn append_price_point(&self, category: &str, point: &PricePoint) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_categories.contains(category) {
            bail!("injected price point failure");
        }
        inner
            .history
            .entry(category.to_string())
            .or_default()
            .push(point.clone());
        Ok(())
    }

    async fn get_price_history(
        &self,
        category: &str,
        window: Duration,
    ) -> Result<Vec<PricePoint>> {
        let cutoff = Utc::now() - window;
        Ok(self
            .history_for(category)
            .into_iter()
            .filter(|p| p.timestamp >= cutoff)
            .collect())
    }

    async fn create_auction_result(&self, result: &AuctionResult) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.results.iter().any(|r| r.item_id == result.item_id) {
            inner.results.push(result.clone());
        }
        Ok(())
    }

    async fn get_auction_results(&self, limit: i64) -> Result<Vec<AuctionResult>> {
        let mut results = self.inner.lock().unwrap().results.clone();
        results.sort_by_key(|r| std::cmp::Reverse(r.closed_at));
        results.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(results)
    }
}
