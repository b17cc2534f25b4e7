//! Hierarchical configuration loading and validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid window padding: lead {0}, lag {1}. Both must be non-negative")]
    InvalidWindowPadding(i64, i64),

    #[error("Invalid ranking weight: {0}. Must be in [0, 1]")]
    InvalidRankingWeight(f64),

    #[error("Invalid similarity threshold: {0}. Must be in [0, 1]")]
    InvalidSimilarityThreshold(f64),

    #[error("Invalid budget: {0}. Must be at least 1")]
    InvalidBudget(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("LLM model name cannot be empty")]
    EmptyModel,

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .donorprobe/config.yaml (project config)
    /// 3. .donorprobe/local.yaml (local overrides, optional)
    /// 4. Environment variables (DONORPROBE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".donorprobe/config.yaml"))
            .merge(Yaml::file(".donorprobe/local.yaml"))
            .merge(Env::prefixed("DONORPROBE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.window.lead_days < 0 || config.window.lag_days < 0 {
            return Err(ConfigError::InvalidWindowPadding(
                config.window.lead_days,
                config.window.lag_days,
            ));
        }

        for weight in [config.ranking.term_weight, config.ranking.vector_weight] {
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::InvalidRankingWeight(weight));
            }
        }
        if !(0.0..=1.0).contains(&config.ranking.similarity_threshold) {
            return Err(ConfigError::InvalidSimilarityThreshold(
                config.ranking.similarity_threshold,
            ));
        }

        if config.budget.max_steps == 0 {
            return Err(ConfigError::InvalidBudget(config.budget.max_steps));
        }
        if config.budget.max_roundtrips == 0 {
            return Err(ConfigError::InvalidBudget(config.budget.max_roundtrips));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        if config.llm.model.is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if config.llm.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.llm.max_retries));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}
