use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};

use crate::error::Result;

pub mod models;
pub mod transaction;

// Re-export transaction types
pub use transaction::{PgTransaction, PgTransactionManager, TransactionManager};

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Connect a pool with an explicit size and acquire timeout
pub async fn connect(database_url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Run the embedded migrations from the workspace `migrations/` directory
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../migrations").run(pool).await?;

    Ok(())
}
