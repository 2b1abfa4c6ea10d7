use anyhow::{Context, Result};
use bazaar_core::{AppConfig, AuctionStore, ConfigLoader, EngineMetrics};
use bazaar_engine::{AuctionRegistry, PriceUpdateScheduler};
use bazaar_pricing::AlgorithmSet;
use bazaar_store::{AuctionDatabase, PgAuctionStore};
use bazaar_web_api::ApiServer;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(about = "Dynamic pricing and auction engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the auction engine with the web API
    Serve {
        /// Config profile (loads config/Config.<profile>.toml on top of the base file)
        #[arg(long)]
        profile: Option<String>,
        /// Listen address override, e.g. "0.0.0.0:8080"
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Print the effective configuration and exit
    ShowConfig {
        /// Config profile
        #[arg(long)]
        profile: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { profile, addr } => {
            let config = load_config(profile.as_deref())?;
            let addr = addr
                .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));
            serve(config, &addr).await
        }
        Commands::ShowConfig { profile } => {
            let config = load_config(profile.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(profile: Option<&str>) -> Result<AppConfig> {
    match profile {
        Some(profile) => ConfigLoader::load_with_profile(profile),
        None => ConfigLoader::load(),
    }
    .context("failed to load configuration")
}

async fn serve(config: AppConfig, addr: &str) -> Result<()> {
    let database =
        AuctionDatabase::connect(&config.database.url, config.database.max_connections)
            .await
            .context("failed to connect to database")?;
    let store: Arc<dyn AuctionStore> = Arc::new(PgAuctionStore::new(database.pool()));
    let algorithms = Arc::new(AlgorithmSet::with_defaults());
    let metrics = Arc::new(EngineMetrics::new());
    let registry = Arc::new(AuctionRegistry::new(
        Arc::clone(&store),
        Arc::clone(&algorithms),
        Arc::clone(&metrics),
        &config,
    ));

    let restored = registry.restore_active().await?;
    tracing::info!(restored, "restored active auctions from store");

    let scheduler = PriceUpdateScheduler::new(
        Arc::clone(&registry),
        Arc::clone(&metrics),
        config.scheduler.clone(),
    );
    tokio::spawn(scheduler.run());

    ApiServer::new(registry, store, algorithms, metrics)
        .serve(addr)
        .await
}
