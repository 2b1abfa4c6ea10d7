use crate::actor::AuctionActor;
use crate::handle::AuctionHandle;
use bazaar_core::config::AppConfig;
use bazaar_core::types::{Auction, Bid, DynamicPricingConfig, Item, ItemStatus, Rarity};
use bazaar_core::{AuctionStore, EngineError, EngineMetrics};
use bazaar_pricing::AlgorithmSet;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;
use uuid::Uuid;

const COMMAND_BUFFER: usize = 32;

/// Request payload for listing a new item.
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub name: String,
    pub category: String,
    pub rarity: Rarity,
    pub base_price: Decimal,
    pub buyout_price: Option<Decimal>,
    pub seller_id: Uuid,
    pub duration_hours: i64,
    /// Pricing algorithm override; the configured default applies when unset.
    /// The override lives with the cached auction: listings reloaded from the
    /// store after a restart fall back to the configured default.
    pub algorithm: Option<String>,
}

/// In-memory cache of live auctions, one actor per auction.
///
/// The map is the cache of record for the hot path; misses fall through to
/// the store and spawn an actor from the loaded state. Bids and reprices
/// are routed through the auction's handle so per-auction ordering is the
/// actor's mailbox order.
pub struct AuctionRegistry {
    auctions: RwLock<HashMap<Uuid, AuctionHandle>>,
    store: Arc<dyn AuctionStore>,
    algorithms: Arc<AlgorithmSet>,
    metrics: Arc<EngineMetrics>,
    pricing_defaults: DynamicPricingConfig,
    bid_deadline: std::time::Duration,
}

impl AuctionRegistry {
    #[must_use]
    pub fn new(
        store: Arc<dyn AuctionStore>,
        algorithms: Arc<AlgorithmSet>,
        metrics: Arc<EngineMetrics>,
        config: &AppConfig,
    ) -> Self {
        Self {
            auctions: RwLock::new(HashMap::new()),
            store,
            algorithms,
            metrics,
            pricing_defaults: config.pricing.clone(),
            bid_deadline: std::time::Duration::from_millis(config.bidding.deadline_ms),
        }
    }

    /// Lists a new item and spawns its actor.
    ///
    /// # Errors
    /// `Validation` for an empty name, non-positive price, or non-positive
    /// duration; `Persist` if the item cannot be written.
    pub async fn create_auction(&self, request: NewAuction) -> Result<Auction, EngineError> {
        if request.name.trim().is_empty() {
            return Err(EngineError::Validation("item name must not be empty".to_string()));
        }
        if request.base_price <= Decimal::ZERO {
            return Err(EngineError::Validation("base price must be positive".to_string()));
        }
        if request.duration_hours <= 0 {
            return Err(EngineError::Validation(
                "auction duration must be at least one hour".to_string(),
            ));
        }

        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4(),
            name: request.name,
            category: request.category,
            rarity: request.rarity,
            base_price: request.base_price,
            current_bid: Decimal::ZERO,
            buyout_price: request.buyout_price,
            seller_id: request.seller_id,
            status: ItemStatus::Active,
            created_at: now,
            end_time: now + Duration::hours(request.duration_hours),
        };
        self.store
            .create_item(&item)
            .await
            .map_err(EngineError::Persist)?;

        let mut pricing = self.pricing_defaults.clone();
        if let Some(algorithm) = request.algorithm {
            pricing.algorithm = algorithm;
        }
        let auction = Auction::new(item, pricing);
        let handle = self.spawn_actor(auction.clone());
        self.auctions
            .write()
            .await
            .insert(auction.item.id, handle);

        tracing::info!(
            item_id = %auction.item.id,
            category = %auction.item.category,
            start_price = %auction.start_price,
            "auction created"
        );
        Ok(auction)
    }

    /// Snapshot of one auction, loading it through from the store on a miss.
    /// Terminal (sold or cancelled) auctions are served read-only and never
    /// re-enter the cache.
    ///
    /// # Errors
    /// `NotFound` if no such item exists; `Persist` if the store fails.
    pub async fn get(&self, item_id: Uuid) -> Result<Auction, EngineError> {
        if let Some(handle) = self.handle_of(item_id).await {
            match handle.snapshot().await {
                Ok(snapshot) => return Ok(snapshot),
                // Dead actor: drop the stale handle and reload below.
                Err(_) => {
                    self.auctions.write().await.remove(&item_id);
                }
            }
        }
        let item = self.stored_item(item_id).await?;
        if item.status == ItemStatus::Active {
            let handle = self.load_item(item).await?;
            handle.snapshot().await
        } else {
            self.fetch_auction(item).await
        }
    }

    /// Routes a bid to the auction's actor under the configured deadline.
    /// A cache miss pays the store load out of the same budget.
    ///
    /// # Errors
    /// Any bid-path [`EngineError`]; `NotFound` if the item does not exist.
    pub async fn place_bid(
        &self,
        item_id: Uuid,
        bidder_id: Uuid,
        amount: Decimal,
    ) -> Result<Bid, EngineError> {
        let deadline = Instant::now() + self.bid_deadline;
        let handle = match self.handle_of(item_id).await {
            Some(handle) => handle,
            None => match tokio::time::timeout_at(deadline, self.load(item_id)).await {
                Ok(loaded) => loaded?,
                Err(_) => return Err(EngineError::Timeout),
            },
        };
        handle.place_bid(bidder_id, amount, deadline).await
    }

    /// Soft-cancels an auction: stops its actor and flips the item status.
    ///
    /// # Errors
    /// `NotFound` if no such item exists; `NotActive` if it already ended;
    /// `Persist` if the store fails.
    pub async fn cancel(&self, item_id: Uuid) -> Result<(), EngineError> {
        let item = self
            .store
            .get_item(item_id)
            .await
            .map_err(EngineError::Persist)?
            .ok_or(EngineError::NotFound)?;
        if item.status != ItemStatus::Active {
            return Err(EngineError::NotActive);
        }
        if let Some(handle) = self.auctions.write().await.remove(&item_id) {
            handle.shutdown().await;
        }
        self.store
            .delete_item(item_id)
            .await
            .map_err(EngineError::Persist)?;
        tracing::info!(%item_id, "auction cancelled");
        Ok(())
    }

    /// Drops a finalized auction from the cache and stops its actor.
    pub async fn retire(&self, item_id: Uuid) {
        if let Some(handle) = self.auctions.write().await.remove(&item_id) {
            handle.shutdown().await;
        }
        self.metrics.record_auction_closed();
    }

    /// Respawns actors for every item still active in the store. Returns the
    /// number of auctions restored.
    ///
    /// # Errors
    /// `Persist` if the store cannot be read.
    pub async fn restore_active(&self) -> Result<usize, EngineError> {
        let items = self
            .store
            .get_active_items()
            .await
            .map_err(EngineError::Persist)?;
        let mut restored = 0;
        for item in items {
            if self.handle_of(item.id).await.is_some() {
                continue;
            }
            let item_id = item.id;
            self.load_item(item).await?;
            restored += 1;
            tracing::debug!(%item_id, "auction restored from store");
        }
        Ok(restored)
    }

    /// Handles for every cached auction, for the scheduler to walk.
    pub async fn handles(&self) -> Vec<(Uuid, AuctionHandle)> {
        self.auctions
            .read()
            .await
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect()
    }

    /// Point-in-time snapshots of every cached auction.
    pub async fn auctions(&self) -> Vec<Auction> {
        let handles = self.handles().await;
        let mut snapshots = Vec::with_capacity(handles.len());
        for (_, handle) in handles {
            if let Ok(snapshot) = handle.snapshot().await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    pub async fn active_count(&self) -> usize {
        self.auctions.read().await.len()
    }

    async fn handle_of(&self, item_id: Uuid) -> Option<AuctionHandle> {
        self.auctions.read().await.get(&item_id).cloned()
    }

    async fn stored_item(&self, item_id: Uuid) -> Result<Item, EngineError> {
        self.store
            .get_item(item_id)
            .await
            .map_err(EngineError::Persist)?
            .ok_or(EngineError::NotFound)
    }

    /// Reconstructs an auction from its stored rows without spawning an actor.
    async fn fetch_auction(&self, item: Item) -> Result<Auction, EngineError> {
        let bids = self
            .store
            .get_item_bids(item.id)
            .await
            .map_err(EngineError::Persist)?;
        let market_data = self
            .store
            .get_market_data(&item.category)
            .await
            .map_err(EngineError::Persist)?;
        Ok(Auction::from_store(
            item,
            bids,
            market_data,
            self.pricing_defaults.clone(),
        ))
    }

    async fn load(&self, item_id: Uuid) -> Result<AuctionHandle, EngineError> {
        let item = self.stored_item(item_id).await?;
        // Sold and cancelled listings are terminal; they must never get a
        // live actor again.
        if item.status != ItemStatus::Active {
            return Err(EngineError::NotActive);
        }
        self.load_item(item).await
    }

    async fn load_item(&self, item: Item) -> Result<AuctionHandle, EngineError> {
        let item_id = item.id;
        let auction = self.fetch_auction(item).await?;

        let mut guard = self.auctions.write().await;
        // Another task may have loaded the same auction while we were
        // reading the store; its actor wins.
        if let Some(existing) = guard.get(&item_id) {
            return Ok(existing.clone());
        }
        let handle = self.spawn_actor(auction);
        guard.insert(item_id, handle.clone());
        Ok(handle)
    }

    fn spawn_actor(&self, auction: Auction) -> AuctionHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = AuctionActor::new(
            auction,
            rx,
            Arc::clone(&self.store),
            Arc::clone(&self.algorithms),
            Arc::clone(&self.metrics),
        );
        tokio::spawn(actor.run());
        AuctionHandle::new(tx)
    }
}
