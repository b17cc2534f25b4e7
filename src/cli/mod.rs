//! Command-line surface for the investigation engine.

pub mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::domain::models::Config;
use crate::domain::ports::{InvestigationStore, SystemClock};
use crate::infrastructure::sqlite::{create_pool, SqliteStore};
use crate::services::QueryCache;

#[derive(Parser)]
#[command(
    name = "donorprobe",
    about = "Legislative conflict-of-interest investigation engine",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a config file, overriding the hierarchical lookup
    #[arg(long, global = true, env = "DONORPROBE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full LLM-driven investigation of a question
    Investigate(commands::investigate::InvestigateArgs),
    /// Resolve the effective analysis window for sessions
    Window(commands::window::WindowArgs),
    /// Aggregate donor contributions to a person or entities
    Donors(commands::donors::DonorsArgs),
    /// Rank bills against search terms and donor evidence
    Rank(commands::rank::RankArgs),
    /// Check a legislator's vote on a bill against their party majority
    Outlier(commands::outlier::OutlierArgs),
}

/// Shared wiring for every subcommand: validated config, a read-only store
/// pool, and the query cache on the system clock.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn InvestigationStore>,
    pub cache: Arc<QueryCache>,
}

impl AppContext {
    pub async fn build(config: Config) -> Result<Self> {
        let pool = create_pool(&config.database.path, config.database.max_connections)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;
        let store: Arc<dyn InvestigationStore> = Arc::new(SqliteStore::new(pool));
        store.health_check().await?;
        let cache = Arc::new(QueryCache::new(Arc::new(SystemClock)));
        Ok(Self {
            config,
            store,
            cache,
        })
    }
}

/// Print an error the way the output mode expects, then exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        eprintln!(
            "{}",
            serde_json::json!({ "error": format!("{err:#}") })
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
