pub mod config;
pub mod config_loader;
pub mod error;
pub mod metrics;
pub mod traits;
pub mod types;

pub use config::{AppConfig, BiddingConfig, DatabaseConfig, SchedulerConfig, ServerConfig};
pub use config_loader::ConfigLoader;
pub use error::EngineError;
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use traits::{AuctionStore, PricingAlgorithm};
pub use types::{
    AdaptiveSettings, Auction, AuctionResult, Bid, DynamicPricingConfig, Item, ItemStatus,
    MarketAnalysis, MarketData, PricePoint, PriceSource, Rarity, TrendDirection,
};
