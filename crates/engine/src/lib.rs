//! Actor-based auction engine.
//!
//! Every live auction is owned by a dedicated actor task that serializes
//! bids and price updates over a command channel. The [`AuctionRegistry`]
//! caches handles to those actors and loads auctions through from the
//! store on a miss; the [`PriceUpdateScheduler`] drives batch price
//! recomputation and retires auctions that have ended.

pub mod actor;
pub mod commands;
pub mod handle;
pub mod registry;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_store;

pub use actor::AuctionActor;
pub use commands::{AuctionCommand, RepriceOutcome};
pub use handle::AuctionHandle;
pub use registry::{AuctionRegistry, NewAuction};
pub use scheduler::{PriceUpdateScheduler, TickReport};
