//! Evidence-backed donor themes synthesized by the LLM.
//!
//! The narrative content is LLM-authored; the engine's responsibility is
//! structural validation against this fixed schema and evidence assembly,
//! not the prose itself.

use serde::{Deserialize, Serialize};

use super::person::EntityId;

/// A donor referenced by a theme, tied back to aggregation evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeDonor {
    pub entity_id: EntityId,
    pub name: String,
    pub total: f64,
}

/// A named cluster of donors sharing a common influence narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorTheme {
    pub id: String,
    pub title: String,
    pub description: String,
    pub donors: Vec<ThemeDonor>,

    /// Free-text evidence bullets supporting the theme.
    pub evidence: Vec<String>,

    /// Suggested follow-up search queries, consumed by the bill ranker.
    pub follow_up_queries: Vec<String>,

    /// Model-assigned confidence, bounded to [0, 1] by validation.
    pub confidence: f64,
}

/// The full synthesized theme set for one aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSet {
    pub themes: Vec<DonorTheme>,
}

impl ThemeSet {
    /// Structural validation of LLM-authored content. Returns the first
    /// violation found as a message suitable for feeding back to the model.
    pub fn validate(&self) -> Result<(), String> {
        for (i, theme) in self.themes.iter().enumerate() {
            if theme.id.trim().is_empty() {
                return Err(format!("theme {i} has an empty id"));
            }
            if theme.title.trim().is_empty() {
                return Err(format!("theme '{}' has an empty title", theme.id));
            }
            if !(0.0..=1.0).contains(&theme.confidence) {
                return Err(format!(
                    "theme '{}' has confidence {} outside [0, 1]",
                    theme.id, theme.confidence
                ));
            }
            if theme.donors.is_empty() {
                return Err(format!(
                    "theme '{}' cites no supporting donors",
                    theme.id
                ));
            }
        }
        Ok(())
    }
}
