use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Throughput/latency counters for the bid path and the price-update loop.
///
/// Owned by the process, consumed by the engine and the health endpoints.
/// All fields are atomics so request handlers and the scheduler can record
/// without taking any lock.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    bids_accepted: AtomicU64,
    bids_rejected: AtomicU64,
    bid_latency_us_total: AtomicU64,
    bid_latency_samples: AtomicU64,
    price_updates_applied: AtomicU64,
    scheduler_ticks: AtomicU64,
    auctions_closed: AtomicU64,
}

impl EngineMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bid_accepted(&self) {
        self.bids_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bid_rejected(&self) {
        self.bids_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Recorded for every bid attempt, accepted or not.
    pub fn record_bid_latency(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.bid_latency_us_total.fetch_add(micros, Ordering::Relaxed);
        self.bid_latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_price_updates(&self, updated: u64) {
        self.price_updates_applied.fetch_add(updated, Ordering::Relaxed);
    }

    pub fn record_scheduler_tick(&self) {
        self.scheduler_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_auction_closed(&self) {
        self.auctions_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy for the health endpoints.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples = self.bid_latency_samples.load(Ordering::Relaxed);
        let total = self.bid_latency_us_total.load(Ordering::Relaxed);
        MetricsSnapshot {
            bids_accepted: self.bids_accepted.load(Ordering::Relaxed),
            bids_rejected: self.bids_rejected.load(Ordering::Relaxed),
            avg_bid_latency_us: if samples == 0 { 0 } else { total / samples },
            price_updates_applied: self.price_updates_applied.load(Ordering::Relaxed),
            scheduler_ticks: self.scheduler_ticks.load(Ordering::Relaxed),
            auctions_closed: self.auctions_closed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub bids_accepted: u64,
    pub bids_rejected: u64,
    pub avg_bid_latency_us: u64,
    pub price_updates_applied: u64,
    pub scheduler_ticks: u64,
    pub auctions_closed: u64,
}
