//! Configuration model for the investigation engine.
//!
//! Loaded hierarchically by `infrastructure::config::ConfigLoader`
//! (defaults -> `.donorprobe/config.yaml` -> `.donorprobe/local.yaml` ->
//! `DONORPROBE_*` environment variables).

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub ranking: RankingConfig,
    pub budget: BudgetConfig,
    pub cache: CacheConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Session-window padding. Donations often precede session activity more
/// than they follow it, hence the asymmetric defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub lead_days: i64,
    pub lag_days: i64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            lead_days: 90,
            lag_days: 45,
        }
    }
}

/// Hybrid ranking weights and gate. Observed-constant defaults; tunable per
/// deployment rather than hard-coded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub term_weight: f64,
    pub vector_weight: f64,
    pub similarity_threshold: f64,
    pub default_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            term_weight: 0.4,
            vector_weight: 0.6,
            similarity_threshold: 0.30,
            default_limit: 25,
        }
    }
}

/// Loop budgets: reasoning steps and tool round-trips.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub max_steps: u32,
    pub max_roundtrips: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_steps: 15,
            max_roundtrips: 10,
        }
    }
}

/// Per-category cache TTLs. Donation data changes faster than session
/// metadata; person search is never cached so identity resolution stays
/// fresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub donation_ttl_secs: u64,
    pub session_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            donation_ttl_secs: 120,
            session_ttl_secs: 3600,
        }
    }
}

/// LLM completion client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    pub max_retries: u32,

    /// Suggested wait surfaced into the conversation when the provider
    /// rate-limits us and supplies no retry-after of its own.
    pub rate_limit_wait_secs: u64,

    /// Per-tool-call timeout inside the loop.
    pub tool_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 4096,
            request_timeout_secs: 120,
            max_retries: 3,
            rate_limit_wait_secs: 60,
            tool_timeout_secs: 30,
        }
    }
}

/// SQLite store settings. The engine only issues parameterized reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ".donorprobe/ingest.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Logging settings consumed at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
