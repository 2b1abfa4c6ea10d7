use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rarity tier of a listed item. Drives a fixed pricing multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Fixed per-tier pricing multiplier (common=1.0 ... legendary=2.0).
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.2,
            Self::Rare => 1.4,
            Self::Epic => 1.7,
            Self::Legendary => 2.0,
        }
    }

    /// Numeric feature value used by the adaptive algorithm.
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 2.0,
            Self::Rare => 3.0,
            Self::Epic => 4.0,
            Self::Legendary => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Active,
    Sold,
    Cancelled,
}

/// A marketplace listing. `end_time` is immutable once set; `current_bid`
/// only increases while the item is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub rarity: Rarity,
    pub base_price: Decimal,
    pub current_bid: Decimal,
    pub buyout_price: Option<Decimal>,
    pub seller_id: Uuid,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// A monetary offer against an auction. At most one bid per auction is
/// marked winning at any instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bid {
    pub id: Uuid,
    pub item_id: Uuid,
    pub bidder_id: Uuid,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
    pub is_winning: bool,
}

/// What caused a price to be recorded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Bid,
    Market,
    Algorithm,
}

/// One point in the time-ordered price series consumed by the market analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: i64,
    pub source: PriceSource,
}

/// Per-category aggregate statistics. Auctions hold a read-only snapshot;
/// the authoritative copy lives in the store, keyed by category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketData {
    pub category: String,
    pub average_price: Decimal,
    pub median_price: Decimal,
    pub price_std_dev: Decimal,
    pub supply_velocity: f64,
    pub demand_velocity: f64,
    pub price_elasticity: f64,
    /// Market saturation in [0, 1].
    pub saturation: f64,
    pub updated_at: DateTime<Utc>,
}

/// Tunables for the adaptive (online learning) pricing variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdaptiveSettings {
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Rolling error-history window; exceeding it evicts the oldest sample.
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,
}

const fn default_learning_rate() -> f64 {
    0.01
}

const fn default_memory_size() -> usize {
    100
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            memory_size: default_memory_size(),
        }
    }
}

/// Algorithm selector plus tunables shared by all pricing variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DynamicPricingConfig {
    pub algorithm: String,
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,
    #[serde(default = "default_time_weight")]
    pub time_weight: f64,
    #[serde(default = "default_demand_weight")]
    pub demand_weight: f64,
    #[serde(default = "default_rarity_weight")]
    pub rarity_weight: f64,
    #[serde(default = "default_volatility_factor")]
    pub volatility_factor: f64,
    /// Maximum downward change per recomputation, as a fraction (-0.05 = -5%).
    #[serde(default = "default_min_change")]
    pub min_change: f64,
    /// Maximum upward change per recomputation, as a fraction (0.15 = +15%).
    #[serde(default = "default_max_change")]
    pub max_change: f64,
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,
    #[serde(default)]
    pub adaptive: AdaptiveSettings,
}

const fn default_base_rate() -> f64 {
    0.02
}

const fn default_time_weight() -> f64 {
    0.6
}

const fn default_demand_weight() -> f64 {
    0.3
}

const fn default_rarity_weight() -> f64 {
    1.0
}

const fn default_volatility_factor() -> f64 {
    0.1
}

const fn default_min_change() -> f64 {
    -0.05
}

const fn default_max_change() -> f64 {
    0.15
}

const fn default_update_interval() -> u64 {
    300
}

impl Default for DynamicPricingConfig {
    fn default() -> Self {
        Self {
            algorithm: "linear".to_string(),
            base_rate: default_base_rate(),
            time_weight: default_time_weight(),
            demand_weight: default_demand_weight(),
            rarity_weight: default_rarity_weight(),
            volatility_factor: default_volatility_factor(),
            min_change: default_min_change(),
            max_change: default_max_change(),
            update_interval_secs: default_update_interval(),
            adaptive: AdaptiveSettings::default(),
        }
    }
}

/// Live pricing and bidding state wrapping a listed item.
///
/// `bid_history` is append-only and time-ordered. `current_price` always
/// stays within the per-tick change bounds of the active pricing algorithm
/// relative to its previous value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Auction {
    pub item: Item,
    pub bid_history: Vec<Bid>,
    pub price_history: Vec<PricePoint>,
    pub current_price: Decimal,
    pub start_price: Decimal,
    pub reserve_price: Decimal,
    pub pricing: DynamicPricingConfig,
    pub market_data: Option<MarketData>,
    pub last_price_update: DateTime<Utc>,
}

impl Auction {
    /// Wraps a freshly listed item. The start and reserve prices both come
    /// from the item's base price.
    #[must_use]
    pub fn new(item: Item, pricing: DynamicPricingConfig) -> Self {
        let start_price = item.base_price;
        let created_at = item.created_at;
        Self {
            item,
            bid_history: Vec::new(),
            price_history: Vec::new(),
            current_price: start_price,
            start_price,
            reserve_price: start_price,
            pricing,
            market_data: None,
            last_price_update: created_at,
        }
    }

    /// Reconstructs an auction from stored state (load-through path).
    #[must_use]
    pub fn from_store(
        item: Item,
        bids: Vec<Bid>,
        market_data: Option<MarketData>,
        pricing: DynamicPricingConfig,
    ) -> Self {
        let start_price = item.base_price;
        let current_price = bids
            .iter()
            .map(|b| b.amount)
            .max()
            .unwrap_or(start_price)
            .max(start_price);
        let last_price_update = bids
            .iter()
            .map(|b| b.placed_at)
            .max()
            .unwrap_or(item.created_at);
        Self {
            item,
            bid_history: bids,
            price_history: Vec::new(),
            current_price,
            start_price,
            reserve_price: start_price,
            pricing,
            market_data,
            last_price_update,
        }
    }

    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        matches!(self.item.status, ItemStatus::Active) && now < self.item.end_time
    }

    #[must_use]
    pub fn winning_bid(&self) -> Option<&Bid> {
        self.bid_history.iter().find(|b| b.is_winning)
    }

    #[must_use]
    pub fn bid_count(&self) -> usize {
        self.bid_history.len()
    }

    /// Seconds from listing to end, never below 1.
    #[must_use]
    pub fn total_duration_secs(&self) -> f64 {
        let secs = (self.item.end_time - self.item.created_at).num_seconds();
        secs.max(1) as f64
    }

    /// Seconds until the auction ends, floored at zero.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> f64 {
        let secs = (self.item.end_time - now).num_seconds();
        secs.max(0) as f64
    }

    /// Elapsed fraction of the auction's lifetime, clamped to [0, 1].
    #[must_use]
    pub fn time_progress(&self, now: DateTime<Utc>) -> f64 {
        let progress = 1.0 - self.remaining_secs(now) / self.total_duration_secs();
        progress.clamp(0.0, 1.0)
    }
}

/// Terminal record written when an auction retires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuctionResult {
    pub item_id: Uuid,
    pub final_price: Decimal,
    pub winner: Option<Uuid>,
    pub bid_count: i32,
    /// Final price relative to the start price.
    pub price_efficiency: f64,
    /// Deviation of the final price from the category average, 0 when the
    /// auction never saw market data.
    pub market_impact: f64,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Derived trend/volatility report. Never persisted as authoritative state;
/// always recomputed from price-point history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketAnalysis {
    pub category: String,
    pub trend_direction: TrendDirection,
    pub trend_strength: f64,
    pub volatility_index: f64,
    pub confidence: f64,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn test_item(end_offset_hours: i64) -> Item {
        let now = Utc::now();
        Item {
            id: Uuid::new_v4(),
            name: "Runed Blade".to_string(),
            category: "weapons".to_string(),
            rarity: Rarity::Rare,
            base_price: dec!(100),
            current_bid: Decimal::ZERO,
            buyout_price: None,
            seller_id: Uuid::new_v4(),
            status: ItemStatus::Active,
            created_at: now,
            end_time: now + Duration::hours(end_offset_hours),
        }
    }

    #[test]
    fn rarity_multipliers_span_spec_range() {
        assert!((Rarity::Common.multiplier() - 1.0).abs() < f64::EPSILON);
        assert!((Rarity::Legendary.multiplier() - 2.0).abs() < f64::EPSILON);
        assert!(Rarity::Epic.multiplier() < Rarity::Legendary.multiplier());
    }

    #[test]
    fn new_auction_starts_at_base_price() {
        let auction = Auction::new(test_item(24), DynamicPricingConfig::default());
        assert_eq!(auction.current_price, dec!(100));
        assert_eq!(auction.start_price, dec!(100));
        assert!(auction.bid_history.is_empty());
    }

    #[test]
    fn time_progress_is_clamped() {
        let auction = Auction::new(test_item(24), DynamicPricingConfig::default());
        let before = auction.item.created_at - Duration::hours(1);
        let after = auction.item.end_time + Duration::hours(1);
        assert!((auction.time_progress(before) - 0.0).abs() < f64::EPSILON);
        assert!((auction.time_progress(after) - 1.0).abs() < f64::EPSILON);
        let halfway = auction.item.created_at + Duration::hours(12);
        assert!((auction.time_progress(halfway) - 0.5).abs() < 0.01);
    }

    #[test]
    fn from_store_recovers_highest_bid_as_current_price() {
        let item = test_item(24);
        let bid = Bid {
            id: Uuid::new_v4(),
            item_id: item.id,
            bidder_id: Uuid::new_v4(),
            amount: dec!(140),
            placed_at: item.created_at + Duration::minutes(5),
            is_winning: true,
        };
        let auction =
            Auction::from_store(item, vec![bid], None, DynamicPricingConfig::default());
        assert_eq!(auction.current_price, dec!(140));
        assert_eq!(auction.winning_bid().map(|b| b.amount), Some(dec!(140)));
    }

    #[test]
    fn ended_auction_is_not_active() {
        let auction = Auction::new(test_item(-1), DynamicPricingConfig::default());
        assert!(!auction.is_active(Utc::now()));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ItemStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
        let trend = serde_json::to_string(&TrendDirection::Up).unwrap();
        assert_eq!(trend, "\"up\"");
    }
}
