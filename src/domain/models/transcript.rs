//! Audit trail of an investigation: steps and their tool invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload or failure of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationOutcome {
    Result(serde_json::Value),
    Error(String),
}

/// One call from the loop into a registered tool. Created per call, never
/// mutated, retained for the conversation's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: Uuid,
    pub tool: String,
    pub arguments: serde_json::Value,
    pub outcome: InvocationOutcome,
    pub invoked_at: DateTime<Utc>,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            tool: tool.into(),
            arguments,
            outcome: InvocationOutcome::Error("not dispatched".to_string()),
            invoked_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: InvocationOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

/// One reasoning turn of the loop: the agent's text (if any) and the tool
/// invocations it triggered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationStep {
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_text: Option<String>,
    pub invocations: Vec<ToolInvocation>,
}

/// Why the loop reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model emitted a plain-text final answer.
    Answered,
    /// The step or round-trip budget ran out; the answer is a forced
    /// best-effort summary.
    BudgetExhausted,
    /// Cooperative cancellation was requested; partial results were
    /// summarized rather than discarded.
    Cancelled,
}

/// Final product of an investigation, including the full audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationReport {
    pub answer: String,
    pub termination: Termination,
    pub steps: Vec<InvestigationStep>,
}
