use thiserror::Error;

/// Failure taxonomy for the bid-acceptance and pricing paths.
///
/// Validation-class variants resolve to 4xx responses at the boundary;
/// `Timeout` and `Persist` surface as 5xx-class responses and are logged
/// with full context by the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("auction not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("auction has ended")]
    NotActive,

    #[error("bid amount must be higher than current price")]
    BidTooLow,

    #[error("deadline exceeded during bid placement")]
    Timeout,

    #[error("store operation failed: {0}")]
    Persist(anyhow::Error),

    #[error("pricing computation failed: {0}")]
    Algorithm(anyhow::Error),
}

impl EngineError {
    /// Whether the failure is the caller's fault (a 4xx-class rejection).
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Validation(_) | Self::NotActive | Self::BidTooLow
        )
    }
}
