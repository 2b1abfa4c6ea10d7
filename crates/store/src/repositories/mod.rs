pub mod bid_repo;
pub mod item_repo;
pub mod market_repo;
pub mod result_repo;

pub use bid_repo::BidRepository;
pub use item_repo::ItemRepository;
pub use market_repo::MarketRepository;
pub use result_repo::ResultRepository;
