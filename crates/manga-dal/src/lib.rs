pub mod error;
pub mod filters;
pub mod manga;
pub mod user;

use std::{future::Future, str::FromStr as _, time::Duration};

pub use error::Error;
pub use filters::{Filters, Metadata, Order};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type ChosenRow = sqlx::sqlite::SqliteRow;
pub type Pool = sqlx::Pool<ChosenDB>;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn new_pool(database_url: &str) -> Result<Pool> {
    new_pool_with_size(database_url, DEFAULT_MAX_CONNECTIONS).await
}

pub async fn new_pool_with_size(database_url: &str, max_connections: u32) -> Result<Pool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Applies the embedded schema, safe to call on every start.
pub async fn migrate(pool: &Pool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// One page of listed rows together with its pagination metadata.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub rows: Vec<T>,
    pub metadata: Metadata,
}

pub(crate) async fn with_timeout<F, T>(timeout: Duration, query: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, query).await {
        Ok(res) => res,
        Err(_) => {
            debug!("Query timed out after {timeout:?}");
            Err(Error::Timeout(timeout))
        }
    }
}
