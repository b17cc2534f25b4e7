//! SQLite adapter for the ingestion database.

pub mod connection;
pub mod store;

pub use connection::{create_pool, create_test_pool, ConnectionError};
pub use store::SqliteStore;
