//! Infrastructure adapters: configuration, storage, and the LLM client.

pub mod config;
pub mod llm;
pub mod logging;
pub mod sqlite;

pub use config::{ConfigError, ConfigLoader};
pub use logging::init_tracing;
