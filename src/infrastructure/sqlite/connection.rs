//! SQLite connection pool management for the ingestion database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to create pool: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),
    #[error("Invalid database path: {0}")]
    InvalidDatabasePath(String),
}

/// Open a read-only pool over the ingestion database.
///
/// The engine never writes to ingestion data, so the connection itself is
/// opened read-only; a bug cannot corrupt the scraper's output.
pub async fn create_pool(path: &str, max_connections: u32) -> Result<SqlitePool, ConnectionError> {
    let connect_options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))
        .map_err(|_| ConnectionError::InvalidDatabasePath(path.to_string()))?
        .read_only(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(connect_options)
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

/// Writable in-memory pool for tests and fixtures.
///
/// Each call opens a uniquely named shared-cache database, so parallel
/// tests never see each other's tables.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    let url = format!(
        "sqlite:file:{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().simple()
    );
    let connect_options = SqliteConnectOptions::from_str(&url)
        .map_err(|_| ConnectionError::InvalidDatabasePath(url.clone()))?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}
