//! Donor theme synthesis: LLM-authored clusters, engine-validated schema.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{DonorTotal, RankedBill, ThemeSet};
use crate::domain::ports::{ChatMessage, CompletionError, CompletionProvider};

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are an investigative research assistant. \
Given per-donor contribution totals and bills ranked against a legislator's \
voting history, propose evidence-backed donor themes. Respond with JSON only, \
matching exactly: {\"themes\": [{\"id\": string, \"title\": string, \
\"description\": string, \"donors\": [{\"entity_id\": integer, \"name\": string, \
\"total\": number}], \"evidence\": [string], \"follow_up_queries\": [string], \
\"confidence\": number between 0 and 1}]}. Cite only donors present in the \
evidence; do not invent names or totals.";

/// Proposes named, evidence-backed donor clusters from aggregator and ranker
/// output. The narrative is authored by the model; this service's contract
/// is evidence assembly and structural validation, nothing more.
pub struct ThemeSynthesizer {
    completion: Arc<dyn CompletionProvider>,
}

impl ThemeSynthesizer {
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// Synthesize themes from donor totals and ranked bills.
    pub async fn synthesize(
        &self,
        totals: &[DonorTotal],
        ranked_bills: &[RankedBill],
    ) -> EngineResult<ThemeSet> {
        let evidence = serde_json::json!({
            "donor_totals": totals,
            "ranked_bills": ranked_bills,
        });
        let history = vec![ChatMessage::User {
            content: format!(
                "Evidence for theme synthesis:\n{}",
                serde_json::to_string_pretty(&evidence)
                    .map_err(|e| EngineError::Fatal(e.to_string()))?
            ),
        }];

        let response = self
            .completion
            .complete(SYNTHESIS_SYSTEM_PROMPT, &history, &[])
            .await
            .map_err(map_completion_error)?;

        let text = response.text.unwrap_or_default();
        let set: ThemeSet = serde_json::from_str(strip_code_fences(&text)).map_err(|e| {
            warn!(error = %e, "theme synthesis returned unparseable JSON");
            EngineError::SchemaViolation(format!("theme JSON did not parse: {e}"))
        })?;
        set.validate().map_err(EngineError::SchemaViolation)?;
        debug!(themes = set.themes.len(), "synthesized donor themes");
        Ok(set)
    }
}

/// Models often wrap JSON replies in markdown fences; tolerate that.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

pub(crate) fn map_completion_error(err: CompletionError) -> EngineError {
    match err {
        CompletionError::RateLimited { retry_after } => EngineError::RateLimited { retry_after },
        CompletionError::Transient(msg) => EngineError::TransientIo(msg),
        CompletionError::InvalidResponse(msg) => {
            EngineError::SchemaViolation(format!("provider response malformed: {msg}"))
        }
        CompletionError::Fatal(msg) => EngineError::Fatal(msg),
    }
}
