//! PostgreSQL persistence for the auction engine.
//!
//! This crate provides:
//! - A pooled database handle
//! - Row models mapping domain entities onto their tables
//! - Repositories for typed database access
//! - [`PgAuctionStore`], the [`bazaar_core::AuctionStore`] implementation

pub mod database;
pub mod models;
pub mod pg_store;
pub mod repositories;

pub use database::AuctionDatabase;
pub use pg_store::PgAuctionStore;
pub use repositories::{BidRepository, ItemRepository, MarketRepository, ResultRepository};
