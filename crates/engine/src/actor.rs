use crate::commands::{AuctionCommand, RepriceOutcome};
use bazaar_core::types::{
    Auction, AuctionResult, Bid, ItemStatus, PricePoint, PriceSource,
};
use bazaar_core::{AuctionStore, EngineError, EngineMetrics};
use bazaar_pricing::AlgorithmSet;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

/// Owns one auction's mutable state and serializes every operation on it.
///
/// Commands arrive over a bounded mpsc channel and are processed one at a
/// time, so two concurrent bids can never interleave their validate/persist/
/// apply steps. State is only mutated after the corresponding store write
/// has succeeded.
pub struct AuctionActor {
    auction: Auction,
    rx: mpsc::Receiver<AuctionCommand>,
    store: Arc<dyn AuctionStore>,
    algorithms: Arc<AlgorithmSet>,
    metrics: Arc<EngineMetrics>,
}

impl AuctionActor {
    #[must_use]
    pub fn new(
        auction: Auction,
        rx: mpsc::Receiver<AuctionCommand>,
        store: Arc<dyn AuctionStore>,
        algorithms: Arc<AlgorithmSet>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            auction,
            rx,
            store,
            algorithms,
            metrics,
        }
    }

    /// Runs the command loop until the channel closes or a `Shutdown`
    /// command arrives.
    pub async fn run(mut self) {
        tracing::debug!(item_id = %self.auction.item.id, "auction actor started");
        while let Some(command) = self.rx.recv().await {
            match command {
                AuctionCommand::PlaceBid {
                    bidder_id,
                    amount,
                    deadline,
                    respond,
                } => {
                    let started = Instant::now();
                    let result = self.apply_bid(bidder_id, amount, deadline).await;
                    self.metrics.record_bid_latency(started.elapsed());
                    match &result {
                        Ok(bid) => {
                            self.metrics.record_bid_accepted();
                            tracing::info!(
                                item_id = %self.auction.item.id,
                                bid_id = %bid.id,
                                amount = %bid.amount,
                                "bid accepted"
                            );
                        }
                        Err(error) => {
                            self.metrics.record_bid_rejected();
                            tracing::debug!(
                                item_id = %self.auction.item.id,
                                %error,
                                "bid rejected"
                            );
                        }
                    }
                    let _ = respond.send(result);
                }
                AuctionCommand::Reprice { respond } => {
                    let _ = respond.send(self.handle_reprice().await);
                }
                AuctionCommand::Snapshot { respond } => {
                    let _ = respond.send(self.auction.clone());
                }
                AuctionCommand::Shutdown => break,
            }
        }
        tracing::debug!(item_id = %self.auction.item.id, "auction actor stopped");
    }

    /// Validates a bid, persists it, then applies it to in-memory state.
    ///
    /// A failed or timed-out persist leaves the auction exactly as it was;
    /// the bid is either fully applied or not applied at all.
    async fn apply_bid(
        &mut self,
        bidder_id: Uuid,
        amount: Decimal,
        deadline: Instant,
    ) -> Result<Bid, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::Validation(
                "bid amount must be positive".to_string(),
            ));
        }
        let now = Utc::now();
        if !self.auction.is_active(now) {
            return Err(EngineError::NotActive);
        }
        if amount <= self.auction.current_price {
            return Err(EngineError::BidTooLow);
        }
        let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
            return Err(EngineError::Timeout);
        };

        let bid = Bid {
            id: Uuid::new_v4(),
            item_id: self.auction.item.id,
            bidder_id,
            amount,
            placed_at: now,
            is_winning: true,
        };
        match tokio::time::timeout(remaining, self.store.create_bid(&bid)).await {
            Err(_) => return Err(EngineError::Timeout),
            Ok(Err(error)) => return Err(EngineError::Persist(error)),
            Ok(Ok(())) => {}
        }

        for prior in &mut self.auction.bid_history {
            prior.is_winning = false;
        }
        self.auction.bid_history.push(bid.clone());
        self.auction.current_price = amount;
        self.auction.item.current_bid = amount;
        self.auction.last_price_update = now;
        let point = PricePoint {
            timestamp: now,
            price: amount,
            volume: i64::try_from(self.auction.bid_history.len()).unwrap_or(i64::MAX),
            source: PriceSource::Bid,
        };
        self.auction.price_history.push(point.clone());

        let algorithm = self.algorithms.resolve(&self.auction.pricing.algorithm);
        if let Err(error) = algorithm.update_parameters(&self.auction, amount) {
            tracing::warn!(
                item_id = %self.auction.item.id,
                %error,
                "pricing feedback update failed"
            );
        }

        // The bid row is already durable; the listing row and price series
        // are brought up to date off the hot path and retried implicitly by
        // the next write if this one fails.
        let store = Arc::clone(&self.store);
        let item = self.auction.item.clone();
        tokio::spawn(async move {
            if let Err(error) = store.update_item(&item).await {
                tracing::warn!(item_id = %item.id, %error, "item update after bid failed");
            }
            if let Err(error) = store.append_price_point(&item.category, &point).await {
                tracing::warn!(
                    item_id = %item.id,
                    %error,
                    "price point append after bid failed"
                );
            }
        });

        Ok(bid)
    }

    /// Recomputes the price, or finalizes the auction if it has ended.
    async fn handle_reprice(&mut self) -> Result<RepriceOutcome, EngineError> {
        let now = Utc::now();
        if !self.auction.is_active(now) {
            return self.retire(now).await.map(RepriceOutcome::Closed);
        }

        let algorithm = self.algorithms.resolve(&self.auction.pricing.algorithm);
        let price = algorithm
            .calculate_price(&self.auction, self.auction.market_data.as_ref())
            .map_err(EngineError::Algorithm)?;
        let point = PricePoint {
            timestamp: now,
            price,
            volume: 0,
            source: PriceSource::Algorithm,
        };
        self.store
            .append_price_point(&self.auction.item.category, &point)
            .await
            .map_err(EngineError::Persist)?;
        self.store
            .update_item(&self.auction.item)
            .await
            .map_err(EngineError::Persist)?;

        self.auction.current_price = price;
        self.auction.last_price_update = now;
        self.auction.price_history.push(point);
        Ok(RepriceOutcome::Updated(price))
    }

    /// Writes the terminal result and flips the item to its final status.
    async fn retire(&mut self, now: DateTime<Utc>) -> Result<AuctionResult, EngineError> {
        let winner = self.auction.winning_bid().map(|b| b.bidder_id);
        let final_price = self.auction.current_price;
        let start = self.auction.start_price.to_f64().unwrap_or(0.0);
        let final_f = final_price.to_f64().unwrap_or(0.0);
        let price_efficiency = if start > 0.0 { final_f / start } else { 0.0 };
        let market_impact = self.auction.market_data.as_ref().map_or(0.0, |market| {
            let average = market.average_price.to_f64().unwrap_or(0.0);
            if average > 0.0 {
                (final_f - average).abs() / average
            } else {
                0.0
            }
        });

        let result = AuctionResult {
            item_id: self.auction.item.id,
            final_price,
            winner,
            bid_count: i32::try_from(self.auction.bid_count()).unwrap_or(i32::MAX),
            price_efficiency,
            market_impact,
            closed_at: now,
        };
        self.store
            .create_auction_result(&result)
            .await
            .map_err(EngineError::Persist)?;

        let mut item = self.auction.item.clone();
        // A status that already went terminal (e.g. a cancellation that
        // raced this retirement) must not be overwritten.
        if item.status == ItemStatus::Active {
            item.status = if winner.is_some() {
                ItemStatus::Sold
            } else {
                ItemStatus::Cancelled
            };
        }
        self.store
            .update_item(&item)
            .await
            .map_err(EngineError::Persist)?;
        self.auction.item = item;

        tracing::info!(
            item_id = %self.auction.item.id,
            final_price = %final_price,
            winner = ?winner,
            "auction retired"
        );
        Ok(result)
    }
}
