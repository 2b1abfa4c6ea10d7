use anyhow::{bail, Result};
use bazaar_core::types::{Auction, MarketData};
use bazaar_core::PricingAlgorithm;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Exponential growth tempered by hourly decay and boosted by bid volume.
///
/// `price = start * e^(growth_rate * elapsed_hours) * decay_rate^elapsed_hours
///          * (1 + bid_boost_rate * bid_count)`
///
/// Hard-capped at five times the start price. Assumes a fixed auction
/// duration window, so the elapsed time is what drives the curve.
#[derive(Debug)]
pub struct ExponentialAlgorithm {
    growth_rate: f64,
    decay_rate: f64,
    bid_boost_rate: f64,
}

const PRICE_CAP_MULTIPLE: f64 = 5.0;

impl Default for ExponentialAlgorithm {
    fn default() -> Self {
        Self {
            growth_rate: 0.05,
            decay_rate: 0.98,
            bid_boost_rate: 0.03,
        }
    }
}

impl ExponentialAlgorithm {
    #[must_use]
    pub const fn new(growth_rate: f64, decay_rate: f64, bid_boost_rate: f64) -> Self {
        Self {
            growth_rate,
            decay_rate,
            bid_boost_rate,
        }
    }

    /// Price at an explicit instant; the trait entry point passes `Utc::now()`.
    ///
    /// # Errors
    /// Fails when the auction's timing data is malformed (end before start).
    pub fn price_at(&self, auction: &Auction, now: DateTime<Utc>) -> Result<Decimal> {
        if auction.item.end_time <= auction.item.created_at {
            bail!(
                "malformed auction timing for item {}: end {} precedes start {}",
                auction.item.id,
                auction.item.end_time,
                auction.item.created_at
            );
        }

        let elapsed_hours =
            ((now - auction.item.created_at).num_seconds().max(0) as f64) / 3600.0;
        let growth = (self.growth_rate * elapsed_hours).exp();
        let decay = self.decay_rate.powf(elapsed_hours);
        let bid_boost = 1.0 + self.bid_boost_rate * auction.bid_count() as f64;

        let start = auction.start_price.to_f64().unwrap_or_default();
        let raw = start * growth * decay * bid_boost;
        let capped = raw.min(start * PRICE_CAP_MULTIPLE);

        Ok(Decimal::from_f64(capped)
            .unwrap_or(auction.current_price)
            .round_dp(4))
    }
}

impl PricingAlgorithm for ExponentialAlgorithm {
    fn calculate_price(&self, auction: &Auction, _market: Option<&MarketData>) -> Result<Decimal> {
        self.price_at(auction, Utc::now())
    }

    fn update_parameters(&self, _auction: &Auction, _actual_price: Decimal) -> Result<()> {
        Ok(())
    }

    fn algorithm_type(&self) -> &'static str {
        "exponential"
    }
}
