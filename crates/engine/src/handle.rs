use crate::commands::{AuctionCommand, RepriceOutcome};
use bazaar_core::types::{Auction, Bid};
use bazaar_core::EngineError;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use uuid::Uuid;

/// Cheap, cloneable handle to one auction's actor.
///
/// All methods are request/response over the actor's command channel. A
/// closed channel means the actor has retired, which callers see as the
/// auction being gone.
#[derive(Debug, Clone)]
pub struct AuctionHandle {
    tx: mpsc::Sender<AuctionCommand>,
}

impl AuctionHandle {
    pub(crate) const fn new(tx: mpsc::Sender<AuctionCommand>) -> Self {
        Self { tx }
    }

    /// Submits a bid to the actor and waits for the verdict.
    ///
    /// # Errors
    /// Any [`EngineError`] produced by bid validation or persistence;
    /// `NotActive` if the actor has already retired.
    pub async fn place_bid(
        &self,
        bidder_id: Uuid,
        amount: Decimal,
        deadline: Instant,
    ) -> Result<Bid, EngineError> {
        let (respond, rx) = oneshot::channel();
        self.tx
            .send(AuctionCommand::PlaceBid {
                bidder_id,
                amount,
                deadline,
                respond,
            })
            .await
            .map_err(|_| EngineError::NotActive)?;
        rx.await.map_err(|_| EngineError::NotActive)?
    }

    /// Asks the actor to recompute its price (or finalize, if ended).
    ///
    /// # Errors
    /// `NotFound` if the actor has already retired, otherwise whatever the
    /// recomputation produced.
    pub async fn reprice(&self) -> Result<RepriceOutcome, EngineError> {
        let (respond, rx) = oneshot::channel();
        self.tx
            .send(AuctionCommand::Reprice { respond })
            .await
            .map_err(|_| EngineError::NotFound)?;
        rx.await.map_err(|_| EngineError::NotFound)?
    }

    /// Point-in-time copy of the auction state.
    ///
    /// # Errors
    /// `NotFound` if the actor has already retired.
    pub async fn snapshot(&self) -> Result<Auction, EngineError> {
        let (respond, rx) = oneshot::channel();
        self.tx
            .send(AuctionCommand::Snapshot { respond })
            .await
            .map_err(|_| EngineError::NotFound)?;
        rx.await.map_err(|_| EngineError::NotFound)
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(AuctionCommand::Shutdown).await;
    }
}
