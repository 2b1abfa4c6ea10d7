use anyhow::{bail, Result};
use bazaar_core::types::{Auction, MarketData};
use bazaar_core::PricingAlgorithm;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Linear drift: start price scaled by time, demand, and rarity multipliers.
///
/// `time_multiplier = 1 + base_rate * time_weight * time_progress`
/// `demand_multiplier = 1 + base_rate * demand_weight * bid_count`
///
/// The result is clamped so a single recomputation never moves the price
/// outside `[min_change, max_change]` of the current price (-5% / +15% by
/// default).
#[derive(Debug, Default)]
pub struct LinearAlgorithm;

impl LinearAlgorithm {
    /// Price at an explicit instant. The trait entry point passes `Utc::now()`;
    /// this form keeps the computation reproducible for a fixed snapshot.
    ///
    /// # Errors
    /// Fails when the auction's timing data is malformed (end before start).
    pub fn price_at(
        &self,
        auction: &Auction,
        now: DateTime<Utc>,
    ) -> Result<Decimal> {
        if auction.item.end_time <= auction.item.created_at {
            bail!(
                "malformed auction timing for item {}: end {} precedes start {}",
                auction.item.id,
                auction.item.end_time,
                auction.item.created_at
            );
        }

        let cfg = &auction.pricing;
        let time_progress = auction.time_progress(now);
        let time_multiplier = 1.0 + cfg.base_rate * cfg.time_weight * time_progress;
        let demand_multiplier =
            1.0 + cfg.base_rate * cfg.demand_weight * auction.bid_count() as f64;
        let rarity_multiplier = auction.item.rarity.multiplier() * cfg.rarity_weight;

        let start = auction.start_price.to_f64().unwrap_or_default();
        let raw = start * time_multiplier * demand_multiplier * rarity_multiplier;

        Ok(clamp_change(
            auction.current_price,
            raw,
            cfg.min_change,
            cfg.max_change,
        ))
    }
}

impl PricingAlgorithm for LinearAlgorithm {
    fn calculate_price(&self, auction: &Auction, _market: Option<&MarketData>) -> Result<Decimal> {
        self.price_at(auction, Utc::now())
    }

    fn update_parameters(&self, _auction: &Auction, _actual_price: Decimal) -> Result<()> {
        Ok(())
    }

    fn algorithm_type(&self) -> &'static str {
        "linear"
    }
}

/// Bounds `candidate` so its change from `current` stays within
/// `[min_change, max_change]` expressed as fractions of `current`.
pub(crate) fn clamp_change(
    current: Decimal,
    candidate: f64,
    min_change: f64,
    max_change: f64,
) -> Decimal {
    let current_f = current.to_f64().unwrap_or_default();
    let lower = current_f * (1.0 + min_change);
    let upper = current_f * (1.0 + max_change);
    let bounded = candidate.clamp(lower, upper);
    Decimal::from_f64(bounded)
        .unwrap_or(current)
        .round_dp(4)
}
