//! The bounded, multi-step tool-calling investigation loop.
//!
//! Drives the LLM through reasoning steps; each step may fan out several
//! independent tool calls, whose results are fed back as conversation
//! context before the next step. Terminates when the model emits a final
//! answer, the budget runs out (forcing one last summarization turn), or a
//! fatal upstream fault occurs.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    Budget, Config, InvestigationReport, InvestigationStep, InvocationOutcome, Termination,
    ToolInvocation,
};
use crate::domain::ports::{
    ChatMessage, CompletionError, CompletionProvider, CompletionResponse, ToolCallRequest,
    ToolResultMessage, ToolSchema,
};
use crate::services::toolkit::{ToolCall, Toolkit};

/// Immediate retry attempts for transient tool failures.
const TOOL_RETRY_ATTEMPTS: u32 = 3;

const INVESTIGATION_SYSTEM_PROMPT: &str = "You are a legislative \
conflict-of-interest investigator. Link campaign-donation records to voting \
behavior using the available tools: resolve the person first, establish the \
session window, aggregate donors, rank bills against donor evidence, and \
check for party-outlier votes. Gather evidence across several tool calls \
before concluding. When you have enough evidence, reply with a final \
plain-text report citing specific donors, amounts, bills, and votes.";

/// One dispatched sibling call's bookkeeping.
struct DispatchOutcome {
    invocation: ToolInvocation,
    result: ToolResultMessage,
    fatal: Option<String>,
}

/// The investigation loop: single-threaded and cooperative at the
/// conversation level (each step depends on the previous step's results),
/// with concurrent fan-out of sibling tool calls within a step.
pub struct InvestigationLoop {
    completion: Arc<dyn CompletionProvider>,
    toolkit: Arc<Toolkit>,
    config: Config,
}

impl InvestigationLoop {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        toolkit: Arc<Toolkit>,
        config: Config,
    ) -> Self {
        Self {
            completion,
            toolkit,
            config,
        }
    }

    /// Run an investigation for a user question until terminal.
    ///
    /// Only a fatal upstream fault (store unreachable, completion capability
    /// down before any step completed) returns an error; every other path
    /// produces a report, degraded if necessary.
    pub async fn run(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<InvestigationReport> {
        let schemas = self.toolkit.schemas();
        let mut history = vec![ChatMessage::User {
            content: question.to_string(),
        }];
        let mut budget = Budget::new(
            self.config.budget.max_steps,
            self.config.budget.max_roundtrips,
        );
        let mut steps: Vec<InvestigationStep> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                info!("cancellation requested; summarizing partial results");
                return self
                    .forced_summary(history, steps, Termination::Cancelled)
                    .await;
            }
            let Some(remaining) = budget.spend_step() else {
                info!("step budget exhausted; forcing summarization turn");
                return self
                    .forced_summary(history, steps, Termination::BudgetExhausted)
                    .await;
            };
            budget = remaining;

            let step_index = u32::try_from(steps.len()).unwrap_or(u32::MAX);
            let response = match self.request_completion(&history, &schemas).await {
                Ok(response) => response,
                Err(err) if steps.is_empty() => return Err(err),
                Err(err) => {
                    // Degraded-but-present beats a hard failure once any
                    // step has completed.
                    warn!(error = %err, "completion failed mid-investigation");
                    return self
                        .forced_summary(history, steps, Termination::BudgetExhausted)
                        .await;
                }
            };

            if response.is_final_answer() {
                let answer = response.text.clone().unwrap_or_default();
                steps.push(InvestigationStep {
                    index: step_index,
                    assistant_text: response.text,
                    invocations: Vec::new(),
                });
                info!(steps = steps.len(), "investigation answered");
                return Ok(InvestigationReport {
                    answer,
                    termination: Termination::Answered,
                    steps,
                });
            }

            debug!(
                step = step_index,
                tool_calls = response.tool_calls.len(),
                "model requested tools"
            );

            // Checked before the assistant turn enters the history so the
            // summarization prompt never follows unanswered tool requests.
            let Some(remaining) = budget.spend_roundtrip() else {
                info!("round-trip budget exhausted; forcing summarization turn");
                steps.push(InvestigationStep {
                    index: step_index,
                    assistant_text: response.text,
                    invocations: Vec::new(),
                });
                return self
                    .forced_summary(history, steps, Termination::BudgetExhausted)
                    .await;
            };
            budget = remaining;
            history.push(ChatMessage::Assistant {
                text: response.text.clone(),
                tool_calls: response.tool_calls.clone(),
            });

            // Sibling calls are independent reads; fan out, then gate on
            // all of them before the next reasoning step.
            let outcomes = join_all(
                response
                    .tool_calls
                    .iter()
                    .map(|request| self.dispatch_one(request)),
            )
            .await;

            let mut invocations = Vec::with_capacity(outcomes.len());
            let mut results = Vec::with_capacity(outcomes.len());
            let mut fatal = None;
            for outcome in outcomes {
                invocations.push(outcome.invocation);
                results.push(outcome.result);
                if fatal.is_none() {
                    fatal = outcome.fatal;
                }
            }
            steps.push(InvestigationStep {
                index: step_index,
                assistant_text: response.text,
                invocations,
            });

            if let Some(message) = fatal {
                return Err(EngineError::Fatal(message));
            }
            history.push(ChatMessage::ToolResults { results });
        }
    }

    /// Request one completion, retrying transient failures immediately and
    /// honoring a rate limit's suggested wait instead of hammering it.
    async fn request_completion(
        &self,
        history: &[ChatMessage],
        schemas: &[ToolSchema],
    ) -> EngineResult<CompletionResponse> {
        let mut attempt = 0u32;
        loop {
            let err = match self
                .completion
                .complete(INVESTIGATION_SYSTEM_PROMPT, history, schemas)
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            attempt += 1;
            match err {
                CompletionError::Transient(msg) if attempt < self.config.llm.max_retries => {
                    warn!(attempt, error = %msg, "transient completion failure, retrying");
                }
                CompletionError::RateLimited { retry_after }
                    if attempt < self.config.llm.max_retries =>
                {
                    warn!(?retry_after, "completion rate limited, waiting");
                    tokio::time::sleep(retry_after).await;
                }
                CompletionError::RateLimited { retry_after } => {
                    return Err(EngineError::RateLimited { retry_after });
                }
                CompletionError::Transient(msg) => return Err(EngineError::TransientIo(msg)),
                CompletionError::InvalidResponse(msg) => {
                    return Err(EngineError::SchemaViolation(msg));
                }
                CompletionError::Fatal(msg) => return Err(EngineError::Fatal(msg)),
            }
        }
    }

    /// Dispatch a single requested tool call: validate, run with timeout and
    /// retry, and convert any failure into a structured tool-result error
    /// the model can react to. Only fatal faults escape the conversation.
    async fn dispatch_one(&self, request: &ToolCallRequest) -> DispatchOutcome {
        let invocation = ToolInvocation::new(&request.name, request.arguments.clone());
        let result = match ToolCall::parse(&request.name, &request.arguments) {
            Ok(call) => self.dispatch_with_retry(&call, &request.arguments).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(value) => DispatchOutcome {
                result: ToolResultMessage {
                    call_id: request.id.clone(),
                    content: value.to_string(),
                    is_error: false,
                },
                invocation: invocation.with_outcome(InvocationOutcome::Result(value)),
                fatal: None,
            },
            Err(err) => {
                let fatal = match &err {
                    EngineError::Fatal(msg) => Some(msg.clone()),
                    _ => None,
                };
                let content = describe_tool_failure(&request.name, &err);
                warn!(tool = %request.name, error = %err, "tool call failed");
                DispatchOutcome {
                    result: ToolResultMessage {
                        call_id: request.id.clone(),
                        content,
                        is_error: true,
                    },
                    invocation: invocation.with_outcome(InvocationOutcome::Error(err.to_string())),
                    fatal,
                }
            }
        }
    }

    async fn dispatch_with_retry(
        &self,
        call: &ToolCall,
        raw_arguments: &serde_json::Value,
    ) -> EngineResult<serde_json::Value> {
        let tool_timeout = Duration::from_secs(self.config.llm.tool_timeout_secs);
        let mut attempt = 0u32;
        loop {
            let err = match tokio::time::timeout(
                tool_timeout,
                self.toolkit.dispatch(call, raw_arguments),
            )
            .await
            {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) => err,
                Err(_) => EngineError::TransientIo(format!(
                    "tool {} timed out after {}s",
                    call.name(),
                    tool_timeout.as_secs()
                )),
            };
            attempt += 1;
            if err.is_transient() && attempt < TOOL_RETRY_ATTEMPTS {
                warn!(tool = call.name(), attempt, error = %err, "retrying transient tool failure");
                continue;
            }
            return Err(err);
        }
    }

    /// One final no-tools turn asking the model to summarize what it has.
    /// If even that fails, fall back to a plain recap so the caller still
    /// receives a degraded-but-present answer.
    async fn forced_summary(
        &self,
        mut history: Vec<ChatMessage>,
        steps: Vec<InvestigationStep>,
        termination: Termination,
    ) -> EngineResult<InvestigationReport> {
        history.push(ChatMessage::User {
            content: "You cannot make further tool calls. Summarize the findings \
                gathered so far into a final report, noting any gaps left by the \
                early termination."
                .to_string(),
        });

        let answer = match self
            .completion
            .complete(INVESTIGATION_SYSTEM_PROMPT, &history, &[])
            .await
        {
            Ok(response) => response.text.unwrap_or_else(|| recap(&steps)),
            Err(err) => {
                warn!(error = %err, "summarization turn failed, using recap");
                recap(&steps)
            }
        };

        Ok(InvestigationReport {
            answer,
            termination,
            steps,
        })
    }
}

/// Structured failure text fed back to the model as an error tool result,
/// phrased so the model can correct course.
fn describe_tool_failure(tool: &str, err: &EngineError) -> String {
    match err {
        EngineError::ToolArgumentInvalid(msg) => {
            format!("{tool} rejected the arguments: {msg}. Correct the arguments and call it again.")
        }
        EngineError::RateLimited { retry_after } => format!(
            "{tool} is rate limited; wait about {}s before retrying it.",
            retry_after.as_secs()
        ),
        EngineError::TransientIo(msg) => {
            format!("{tool} failed transiently ({msg}); it may succeed if retried.")
        }
        other => format!("{tool} failed: {other}"),
    }
}

fn recap(steps: &[InvestigationStep]) -> String {
    let invocations: usize = steps.iter().map(|s| s.invocations.len()).sum();
    format!(
        "Investigation ended early after {} reasoning step(s) and {} tool call(s). \
         The gathered evidence is preserved in the investigation transcript.",
        steps.len(),
        invocations
    )
}
