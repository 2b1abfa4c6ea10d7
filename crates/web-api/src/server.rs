use crate::handlers;
use axum::{
    routing::{delete, get, post},
    Router,
};
use bazaar_core::{AuctionStore, EngineMetrics};
use bazaar_engine::AuctionRegistry;
use bazaar_pricing::AlgorithmSet;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handles every request handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AuctionRegistry>,
    pub store: Arc<dyn AuctionStore>,
    pub algorithms: Arc<AlgorithmSet>,
    pub metrics: Arc<EngineMetrics>,
}

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    #[must_use]
    pub fn new(
        registry: Arc<AuctionRegistry>,
        store: Arc<dyn AuctionStore>,
        algorithms: Arc<AlgorithmSet>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            state: AppState {
                registry,
                store,
                algorithms,
                metrics,
            },
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/v1/auctions", get(handlers::list_auctions))
            .route("/api/v1/auctions", post(handlers::create_auction))
            .route("/api/v1/auctions/:item_id", get(handlers::get_auction))
            .route("/api/v1/auctions/:item_id", delete(handlers::cancel_auction))
            .route("/api/v1/auctions/:item_id/bid", post(handlers::place_bid))
            .route("/api/v1/results", get(handlers::recent_results))
            .route("/api/v1/market/analysis", get(handlers::market_analysis_all))
            .route(
                "/api/v1/market/analysis/:category",
                get(handlers::market_analysis),
            )
            .route("/api/v1/algorithms", get(handlers::list_algorithms))
            .route("/api/v1/system/health", get(handlers::health))
            .route("/health", get(handlers::health))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Binds the listener and serves requests until shutdown.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve
    /// requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("auction API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
