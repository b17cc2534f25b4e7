//! Port over the LLM completion capability.
//!
//! The engine consumes the raw provider only through this "complete with
//! tools" abstraction: a message history plus declared tool schemas in,
//! either free text or structured tool-call requests out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A tool the model may call, with its declared argument schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A structured tool-call request emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, echoed back on the result message.
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Result of one tool call, fed back into the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultMessage {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

/// One turn of the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    User {
        content: String,
    },
    Assistant {
        text: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    },
    ToolResults {
        results: Vec<ToolResultMessage>,
    },
}

/// The model's reply to one completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Free-text content, when present.
    pub text: Option<String>,

    /// Tool-call requests; empty means the model emitted a final answer.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl CompletionResponse {
    pub fn is_final_answer(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Errors from the completion capability.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("fatal completion failure: {0}")]
    Fatal(String),
}

impl CompletionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CompletionError::Transient(_))
    }
}

/// Port trait for LLM completion with tool calling.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Request one completion over the given history and tool schemas.
    ///
    /// An empty `tools` slice forbids tool use for that turn (used by the
    /// forced summarization turn on budget exhaustion).
    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<CompletionResponse, CompletionError>;
}
