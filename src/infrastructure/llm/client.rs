//! HTTP completion client for an Anthropic-style messages API.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::models::LlmConfig;
use crate::domain::ports::{
    ChatMessage, CompletionError, CompletionProvider, CompletionResponse, ToolCallRequest,
    ToolSchema,
};
use crate::infrastructure::llm::error::ApiError;
use crate::infrastructure::llm::types::{
    ApiMessage, ApiTool, ContentBlock, MessageRequest, MessageResponse,
};

/// Completion client over the `/v1/messages` endpoint with tool use.
///
/// Retry policy lives in the investigation loop, not here; this adapter only
/// classifies failures so the loop can decide what to do with them.
pub struct AnthropicClient {
    http: ReqwestClient,
    base_url: String,
    api_key: String,
    config: LlmConfig,
}

impl AnthropicClient {
    pub fn new(config: LlmConfig, api_key: String) -> Result<Self, CompletionError> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CompletionError::Fatal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            config,
        })
    }

    /// Read the API key from `ANTHROPIC_API_KEY`.
    pub fn from_env(config: LlmConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            CompletionError::Fatal("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;
        Self::new(config, api_key)
    }

    fn build_request(
        &self,
        system: &str,
        history: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> MessageRequest {
        let messages = history.iter().map(to_api_message).collect();
        let tools = tools
            .iter()
            .map(|t| ApiTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect();

        MessageRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: system.to_string(),
            messages,
            tools,
        }
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    #[instrument(skip_all, fields(turns = history.len(), tools = tools.len()))]
    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        tools: &[ToolSchema],
    ) -> Result<CompletionResponse, CompletionError> {
        let request = self.build_request(system, history, tools);
        let default_wait = Duration::from_secs(self.config.rate_limit_wait_secs);

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    ApiError::Network(e.to_string()).into_completion_error(default_wait)
                } else {
                    CompletionError::Fatal(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(
                ApiError::from_status(status, retry_after, body).into_completion_error(default_wait)
            );
        }

        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;
        debug!(stop_reason = ?message.stop_reason, "completion received");
        Ok(to_completion_response(message))
    }
}

fn to_api_message(message: &ChatMessage) -> ApiMessage {
    match message {
        ChatMessage::User { content } => ApiMessage {
            role: "user",
            content: vec![ContentBlock::Text {
                text: content.clone(),
            }],
        },
        ChatMessage::Assistant { text, tool_calls } => {
            let mut content = Vec::new();
            if let Some(text) = text {
                content.push(ContentBlock::Text { text: text.clone() });
            }
            for call in tool_calls {
                content.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.arguments.clone(),
                });
            }
            ApiMessage {
                role: "assistant",
                content,
            }
        }
        // Tool results ride back on a user-role message per the wire format.
        ChatMessage::ToolResults { results } => ApiMessage {
            role: "user",
            content: results
                .iter()
                .map(|r| ContentBlock::ToolResult {
                    tool_use_id: r.call_id.clone(),
                    content: r.content.clone(),
                    is_error: r.is_error,
                })
                .collect(),
        },
    }
}

fn to_completion_response(message: MessageResponse) -> CompletionResponse {
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();
    for block in message.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCallRequest {
                id,
                name,
                arguments: input,
            }),
            ContentBlock::ToolResult { .. } => {}
        }
    }
    let text = if text_parts.is_empty() {
        None
    } else {
        Some(text_parts.join("\n"))
    };
    CompletionResponse { text, tool_calls }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: &str) -> AnthropicClient {
        let config = LlmConfig {
            base_url: url.to_string(),
            rate_limit_wait_secs: 60,
            ..Default::default()
        };
        AnthropicClient::new(config, "test-key".to_string()).unwrap()
    }

    #[tokio::test]
    async fn parses_text_and_tool_use_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(
                r#"{"content":[
                    {"type":"text","text":"Let me look that up."},
                    {"type":"tool_use","id":"tu_1","name":"resolve_person","input":{"name":"Smith"}}
                ],"stop_reason":"tool_use"}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let history = vec![ChatMessage::User {
            content: "Who is Smith?".to_string(),
        }];
        let response = client.complete("system", &history, &[]).await.unwrap();

        assert_eq!(response.text.as_deref(), Some("Let me look that up."));
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "resolve_person");
        assert!(!response.is_final_answer());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn text_only_reply_is_final_answer() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"Done."}],"stop_reason":"end_turn"}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let history = vec![ChatMessage::User {
            content: "q".to_string(),
        }];
        let response = client.complete("system", &history, &[]).await.unwrap();
        assert!(response.is_final_answer());
        assert_eq!(response.text.as_deref(), Some("Done."));
    }

    #[tokio::test]
    async fn rate_limit_surfaces_retry_after() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .with_header("retry-after", "17")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let history = vec![ChatMessage::User {
            content: "q".to_string(),
        }];
        let err = client.complete("system", &history, &[]).await.unwrap_err();
        match err {
            CompletionError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(17));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_map_to_transient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let history = vec![ChatMessage::User {
            content: "q".to_string(),
        }];
        let err = client.complete("system", &history, &[]).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server.url());
        let history = vec![ChatMessage::User {
            content: "q".to_string(),
        }];
        let err = client.complete("system", &history, &[]).await.unwrap_err();
        assert!(matches!(err, CompletionError::InvalidResponse(_)));
    }

    #[test]
    fn tool_results_serialize_on_user_role() {
        let message = ChatMessage::ToolResults {
            results: vec![crate::domain::ports::ToolResultMessage {
                call_id: "tu_1".to_string(),
                content: "{}".to_string(),
                is_error: false,
            }],
        };
        let api = to_api_message(&message);
        assert_eq!(api.role, "user");
        assert!(matches!(api.content[0], ContentBlock::ToolResult { .. }));
    }
}
