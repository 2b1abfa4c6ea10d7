use bazaar_core::types::{Auction, AuctionResult, Bid};
use bazaar_core::EngineError;
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

/// Messages accepted by a single auction's actor.
///
/// Each command carries a oneshot responder; a dropped responder means the
/// caller gave up and the actor just discards the reply.
#[derive(Debug)]
pub enum AuctionCommand {
    PlaceBid {
        bidder_id: Uuid,
        amount: Decimal,
        /// Hard deadline for the whole placement, persistence included.
        deadline: Instant,
        respond: oneshot::Sender<Result<Bid, EngineError>>,
    },
    Reprice {
        respond: oneshot::Sender<Result<RepriceOutcome, EngineError>>,
    },
    Snapshot {
        respond: oneshot::Sender<Auction>,
    },
    Shutdown,
}

/// What a scheduled recomputation did to the auction.
#[derive(Debug)]
pub enum RepriceOutcome {
    /// The auction is still running and its price was recalculated.
    Updated(Decimal),
    /// The auction had ended; it was finalized and should be dropped
    /// from the registry.
    Closed(AuctionResult),
}
