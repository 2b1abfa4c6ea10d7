use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Connection-pool handle for the auction database.
pub struct AuctionDatabase {
    pool: PgPool,
}

impl AuctionDatabase {
    /// Connects to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}
