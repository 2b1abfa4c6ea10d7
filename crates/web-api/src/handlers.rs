use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bazaar_core::types::{Auction, AuctionResult, Bid, MarketAnalysis, Rarity};
use bazaar_core::{EngineError, MetricsSnapshot};
use bazaar_engine::NewAuction;
use bazaar_market::MarketAnalyzer;
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Price-history window fed to the market analyzer.
const ANALYSIS_WINDOW_HOURS: i64 = 24;

const RECENT_RESULTS_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateAuctionRequest {
    pub name: String,
    pub category: String,
    pub rarity: Rarity,
    pub base_price: Decimal,
    #[serde(default)]
    pub buyout_price: Option<Decimal>,
    pub seller_id: Uuid,
    pub duration_hours: i64,
    #[serde(default)]
    pub algorithm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceBidRequest {
    pub bidder_id: Uuid,
    pub amount: Decimal,
}

#[derive(Serialize)]
pub struct AlgorithmsResponse {
    pub algorithms: Vec<&'static str>,
    pub adaptive_accuracy: f64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_auctions: usize,
    pub adaptive_accuracy: f64,
    pub metrics: MetricsSnapshot,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn map_error(error: &EngineError) -> ApiError {
    let status = match error {
        EngineError::NotFound => StatusCode::NOT_FOUND,
        EngineError::Validation(_) | EngineError::NotActive | EngineError::BidTooLow => {
            StatusCode::BAD_REQUEST
        }
        EngineError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        EngineError::Persist(_) | EngineError::Algorithm(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if !error.is_rejection() {
        tracing::error!(%error, "request failed");
    }
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Lists every cached auction.
pub async fn list_auctions(State(state): State<AppState>) -> Json<Vec<Auction>> {
    Json(state.registry.auctions().await)
}

/// Creates a new auction listing.
///
/// # Errors
/// `400` for invalid listing parameters, `500` if persistence fails.
pub async fn create_auction(
    State(state): State<AppState>,
    Json(req): Json<CreateAuctionRequest>,
) -> Result<(StatusCode, Json<Auction>), ApiError> {
    let auction = state
        .registry
        .create_auction(NewAuction {
            name: req.name,
            category: req.category,
            rarity: req.rarity,
            base_price: req.base_price,
            buyout_price: req.buyout_price,
            seller_id: req.seller_id,
            duration_hours: req.duration_hours,
            algorithm: req.algorithm,
        })
        .await
        .map_err(|e| map_error(&e))?;
    Ok((StatusCode::CREATED, Json(auction)))
}

/// Fetches one auction, loading it from the store if it is not cached.
///
/// # Errors
/// `404` if no such auction exists.
pub async fn get_auction(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Auction>, ApiError> {
    let auction = state
        .registry
        .get(item_id)
        .await
        .map_err(|e| map_error(&e))?;
    Ok(Json(auction))
}

/// Places a bid on an auction.
///
/// # Errors
/// `400` for rejected bids, `404` for unknown auctions, `504` when the bid
/// deadline is exceeded, `500` when persistence fails.
pub async fn place_bid(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(req): Json<PlaceBidRequest>,
) -> Result<(StatusCode, Json<Bid>), ApiError> {
    let bid = state
        .registry
        .place_bid(item_id, req.bidder_id, req.amount)
        .await
        .map_err(|e| map_error(&e))?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// Cancels an active auction.
///
/// # Errors
/// `404` for unknown auctions, `400` if the auction already ended.
pub async fn cancel_auction(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .cancel(item_id)
        .await
        .map_err(|e| map_error(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recently closed auctions, newest first.
///
/// # Errors
/// `500` if the store cannot be read.
pub async fn recent_results(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuctionResult>>, ApiError> {
    let results = state
        .store
        .get_auction_results(RECENT_RESULTS_LIMIT)
        .await
        .map_err(|e| map_error(&EngineError::Persist(e)))?;
    Ok(Json(results))
}

/// Trend analysis for one category over the last 24 hours.
///
/// # Errors
/// `500` if the price history cannot be read.
pub async fn market_analysis(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<MarketAnalysis>, ApiError> {
    let history = state
        .store
        .get_price_history(&category, Duration::hours(ANALYSIS_WINDOW_HOURS))
        .await
        .map_err(|e| map_error(&EngineError::Persist(e)))?;
    Ok(Json(MarketAnalyzer::analyze(&category, &history)))
}

/// Trend analysis for every category with a live auction.
///
/// # Errors
/// `500` if the price history cannot be read.
pub async fn market_analysis_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketAnalysis>>, ApiError> {
    let categories: BTreeSet<String> = state
        .registry
        .auctions()
        .await
        .into_iter()
        .map(|a| a.item.category)
        .collect();

    let mut analyses = Vec::with_capacity(categories.len());
    for category in categories {
        let history = state
            .store
            .get_price_history(&category, Duration::hours(ANALYSIS_WINDOW_HOURS))
            .await
            .map_err(|e| map_error(&EngineError::Persist(e)))?;
        analyses.push(MarketAnalyzer::analyze(&category, &history));
    }
    Ok(Json(analyses))
}

/// Registered pricing algorithms and the adaptive model's rolling accuracy.
pub async fn list_algorithms(State(state): State<AppState>) -> Json<AlgorithmsResponse> {
    Json(AlgorithmsResponse {
        algorithms: state.algorithms.names(),
        adaptive_accuracy: state.algorithms.adaptive_accuracy(),
    })
}

/// Liveness plus engine counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        active_auctions: state.registry.active_count().await,
        adaptive_accuracy: state.algorithms.adaptive_accuracy(),
        metrics: state.metrics.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_client_errors() {
        assert_eq!(map_error(&EngineError::NotFound).0, StatusCode::NOT_FOUND);
        assert_eq!(map_error(&EngineError::BidTooLow).0, StatusCode::BAD_REQUEST);
        assert_eq!(map_error(&EngineError::NotActive).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            map_error(&EngineError::Validation("bad".into())).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn faults_map_to_server_errors() {
        assert_eq!(
            map_error(&EngineError::Timeout).0,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            map_error(&EngineError::Persist(anyhow::anyhow!("down"))).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bid_request_deserializes() {
        let req: PlaceBidRequest = serde_json::from_str(
            r#"{"bidder_id":"6f4ff82b-6f9a-4c1e-8ab1-9a8b2a1a2b3c","amount":"110.50"}"#,
        )
        .unwrap();
        assert_eq!(req.amount, Decimal::new(11050, 2));
    }
}
