use crate::commands::RepriceOutcome;
use crate::registry::AuctionRegistry;
use bazaar_core::config::SchedulerConfig;
use bazaar_core::EngineMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Background loop that walks every cached auction on a fixed interval and
/// asks its actor to recompute (or finalize, once ended).
///
/// One slow or failing auction never blocks the rest of the batch: each
/// reprice runs under its own timeout and failures are logged and skipped.
pub struct PriceUpdateScheduler {
    registry: Arc<AuctionRegistry>,
    metrics: Arc<EngineMetrics>,
    config: SchedulerConfig,
}

/// Outcome counts for a single batch pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub processed: usize,
    pub updated: usize,
    pub closed: usize,
}

impl PriceUpdateScheduler {
    #[must_use]
    pub fn new(
        registry: Arc<AuctionRegistry>,
        metrics: Arc<EngineMetrics>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            metrics,
            config,
        }
    }

    /// Runs the tick loop forever. Returns immediately when disabled.
    pub async fn run(self) {
        if !self.config.enabled {
            tracing::info!("price update scheduler disabled");
            return;
        }
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            interval_secs = self.config.interval_secs,
            "price update scheduler started"
        );
        loop {
            ticker.tick().await;
            let report = self.run_tick().await;
            tracing::info!(
                processed = report.processed,
                updated = report.updated,
                closed = report.closed,
                "price update tick complete"
            );
        }
    }

    /// Walks every cached auction once.
    pub async fn run_tick(&self) -> TickReport {
        let budget = Duration::from_secs(self.config.per_auction_timeout_secs);
        let mut report = TickReport::default();

        for (item_id, handle) in self.registry.handles().await {
            report.processed += 1;
            match tokio::time::timeout(budget, handle.reprice()).await {
                Err(_) => {
                    tracing::warn!(%item_id, "price update timed out");
                }
                Ok(Err(error)) => {
                    tracing::warn!(%item_id, %error, "price update failed");
                }
                Ok(Ok(RepriceOutcome::Updated(price))) => {
                    report.updated += 1;
                    tracing::debug!(%item_id, %price, "price updated");
                }
                Ok(Ok(RepriceOutcome::Closed(result))) => {
                    report.closed += 1;
                    self.registry.retire(item_id).await;
                    tracing::info!(
                        %item_id,
                        final_price = %result.final_price,
                        bid_count = result.bid_count,
                        "auction closed by scheduler"
                    );
                }
            }
        }

        self.metrics.record_scheduler_tick();
        self.metrics.record_price_updates(report.updated as u64);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NewAuction;
    use crate::test_store::MemoryStore;
    use bazaar_core::config::AppConfig;
    use bazaar_core::types::{ItemStatus, Rarity};
    use bazaar_core::AuctionStore;
    use bazaar_pricing::AlgorithmSet;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn fixture(store: Arc<MemoryStore>) -> (Arc<AuctionRegistry>, PriceUpdateScheduler) {
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(AuctionRegistry::new(
            store,
            Arc::new(AlgorithmSet::with_defaults()),
            Arc::clone(&metrics),
            &AppConfig::default(),
        ));
        let scheduler = PriceUpdateScheduler::new(
            Arc::clone(&registry),
            metrics,
            SchedulerConfig::default(),
        );
        (registry, scheduler)
    }

    async fn list(registry: &AuctionRegistry, name: &str, category: &str) -> Uuid {
        registry
            .create_auction(NewAuction {
                name: name.to_string(),
                category: category.to_string(),
                rarity: Rarity::Common,
                base_price: dec!(100),
                buyout_price: None,
                seller_id: Uuid::new_v4(),
                duration_hours: 24,
                algorithm: None,
            })
            .await
            .unwrap()
            .item
            .id
    }

    #[tokio::test]
    async fn tick_updates_every_active_auction() {
        let store = Arc::new(MemoryStore::new());
        let (registry, scheduler) = fixture(store.clone());
        let first = list(&registry, "Runed Blade", "weapons").await;
        list(&registry, "Iron Helm", "armor").await;

        let report = scheduler.run_tick().await;
        assert_eq!(report.processed, 2);
        assert_eq!(report.updated, 2);
        assert_eq!(report.closed, 0);

        let snapshot = registry.get(first).await.unwrap();
        assert_eq!(snapshot.price_history.len(), 1);
        assert_eq!(store.history_for("weapons").len(), 1);
    }

    #[tokio::test]
    async fn tick_skips_failing_auction_and_continues() {
        let store = Arc::new(MemoryStore::new());
        let (registry, scheduler) = fixture(store.clone());
        list(&registry, "Runed Blade", "weapons").await;
        list(&registry, "Cursed Idol", "relics").await;
        list(&registry, "Iron Helm", "armor").await;

        store.fail_price_points_for("relics");
        let report = scheduler.run_tick().await;
        assert_eq!(report.processed, 3);
        assert_eq!(report.updated, 2);
        assert_eq!(report.closed, 0);
        // The failed auction stays cached for the next tick.
        assert_eq!(registry.active_count().await, 3);
    }

    #[tokio::test]
    async fn tick_retires_ended_auctions() {
        let store = Arc::new(MemoryStore::new());
        let (registry, scheduler) = fixture(store.clone());
        let item_id = store.seed_item("Dusty Tome", "books", dec!(50), -1);
        store.seed_bid(item_id, dec!(90), true);
        registry.get(item_id).await.unwrap();

        let report = scheduler.run_tick().await;
        assert_eq!(report.processed, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.closed, 1);
        assert_eq!(registry.active_count().await, 0);

        let results = store.get_auction_results(10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].final_price, dec!(90));
        assert_eq!(results[0].bid_count, 1);
        assert!(results[0].winner.is_some());
        assert!((results[0].price_efficiency - 1.8).abs() < 1e-9);
        assert_eq!(store.item(item_id).unwrap().status, ItemStatus::Sold);
    }

    #[tokio::test]
    async fn ended_auction_without_bids_is_cancelled() {
        let store = Arc::new(MemoryStore::new());
        let (registry, scheduler) = fixture(store.clone());
        let item_id = store.seed_item("Dusty Tome", "books", dec!(50), -1);
        registry.get(item_id).await.unwrap();

        let report = scheduler.run_tick().await;
        assert_eq!(report.closed, 1);

        let results = store.get_auction_results(10).await.unwrap();
        assert!(results[0].winner.is_none());
        assert_eq!(store.item(item_id).unwrap().status, ItemStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_auction_is_not_resurrected_by_a_tick() {
        let store = Arc::new(MemoryStore::new());
        let (registry, scheduler) = fixture(store.clone());
        let item_id = list(&registry, "Runed Blade", "weapons").await;
        registry
            .place_bid(item_id, Uuid::new_v4(), dec!(120))
            .await
            .unwrap();
        registry.cancel(item_id).await.unwrap();
        assert_eq!(store.item(item_id).unwrap().status, ItemStatus::Cancelled);

        // Reading it back must not re-admit it to the live set, and the
        // next tick must not close it as sold despite the winning bid.
        let snapshot = registry.get(item_id).await.unwrap();
        assert_eq!(snapshot.item.status, ItemStatus::Cancelled);
        assert_eq!(registry.active_count().await, 0);

        let report = scheduler.run_tick().await;
        assert_eq!(report.processed, 0);
        assert_eq!(report.closed, 0);
        assert_eq!(store.item(item_id).unwrap().status, ItemStatus::Cancelled);
        assert!(store.get_auction_results(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tick_records_metrics() {
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(EngineMetrics::new());
        let registry = Arc::new(AuctionRegistry::new(
            store,
            Arc::new(AlgorithmSet::with_defaults()),
            Arc::clone(&metrics),
            &AppConfig::default(),
        ));
        let scheduler = PriceUpdateScheduler::new(
            Arc::clone(&registry),
            Arc::clone(&metrics),
            SchedulerConfig::default(),
        );
        list(&registry, "Runed Blade", "weapons").await;

        scheduler.run_tick().await;
        let snap = metrics.snapshot();
        assert_eq!(snap.scheduler_ticks, 1);
        assert_eq!(snap.price_updates_applied, 1);
    }
}
