//! The orchestration loop: one user turn from message to persisted answer.

use crate::assembler::ContextAssembler;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use wayfarer_core::error::{Error, ModelError};
use wayfarer_core::event::{EventSink, TurnEvent};
use wayfarer_core::history::ChatHistoryStore;
use wayfarer_core::message::{Message, UserId};
use wayfarer_core::provider::{Provider, ProviderRequest, ProviderResponse};
use wayfarer_core::tool::{ToolCall, ToolRegistry, ToolResult};
use wayfarer_memory::MemoryUpdater;

/// What the model says when the tool budget runs out before it finishes.
const TOOL_BUDGET_EXHAUSTED: &str =
    "I wasn't able to finish researching this within my tool budget. \
     Could you narrow the request, or ask me to continue from here?";

/// What the user sees when a turn aborts. The underlying cause goes to the
/// logs, never to the chat surface.
pub const TURN_FAILED_APOLOGY: &str =
    "I'm sorry, I ran into a problem while working on that. Please try again in a moment.";

/// Retries for timed-out model calls. A chat completion has no server-side
/// effects, so replaying it is safe.
const TIMEOUT_RETRIES: u32 = 2;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Runs conversation turns for one user against one tool registry.
///
/// Per turn: assemble context, loop model calls and tool executions until
/// the model answers in plain text (or the round budget runs out), persist
/// the user/assistant exchange atomically, then schedule the memory update
/// without awaiting it.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,

    /// The model name sent with every request
    model: String,

    temperature: f32,

    max_tokens: Option<u32>,

    tools: Arc<ToolRegistry>,

    assembler: ContextAssembler,

    history: Arc<dyn ChatHistoryStore>,

    updater: MemoryUpdater,

    /// Maximum tool-call rounds per turn before forced finalization
    max_rounds: u32,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<ToolRegistry>,
        assembler: ContextAssembler,
        history: Arc<dyn ChatHistoryStore>,
        updater: MemoryUpdater,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            tools,
            assembler,
            history,
            updater,
            max_rounds: 8,
        }
    }

    /// Set the maximum number of tool-call rounds per turn.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    /// Set the default max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Run one conversation turn.
    ///
    /// On success: history gains exactly the user message and the final
    /// assistant answer, `events` carries one `final_answer`, and the turn
    /// summary is queued for the background memory writer. On failure:
    /// history gains nothing and `events` carries exactly one `error`.
    pub async fn run_turn(
        &self,
        user: &UserId,
        user_message: &str,
        events: &EventSink,
    ) -> Result<String, Error> {
        info!(user = %user, "Processing turn");
        events.emit(TurnEvent::Thinking {
            message: "Assembling context".into(),
        });

        let mut messages = match self.assembler.assemble(user, user_message).await {
            Ok(messages) => messages,
            Err(e) => {
                error!(user = %user, error = %e, "Context assembly failed");
                events.emit(TurnEvent::Error {
                    message: TURN_FAILED_APOLOGY.into(),
                });
                return Err(e.into());
            }
        };

        let tool_definitions = self.tools.definitions();
        let mut final_text: Option<String> = None;

        for round in 1..=self.max_rounds {
            debug!(user = %user, round, "Loop round");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
            };

            let response = match self.complete_with_retry(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(user = %user, error = %e, "Model call failed");
                    events.emit(TurnEvent::Error {
                        message: TURN_FAILED_APOLOGY.into(),
                    });
                    return Err(e.into());
                }
            };

            if response.message.tool_calls.is_empty() {
                final_text = Some(response.message.content.clone());
                break;
            }

            // The model wants tools. Record its request, then run each call
            // to completion (started plus finished/failed) before the next
            // model call.
            let tool_calls = response.message.tool_calls.clone();
            messages.push(response.message);

            for tc in &tool_calls {
                let arguments: serde_json::Value =
                    serde_json::from_str(&tc.arguments).unwrap_or_default();
                events.emit(TurnEvent::ToolCallStarted {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: arguments.clone(),
                });

                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments,
                };

                let result = match self.tools.invoke(&call).await {
                    Ok(result) => {
                        events.emit(TurnEvent::ToolCallFinished {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            output: result.output.clone(),
                        });
                        result
                    }
                    Err(e) => {
                        // Fold the failure back into the conversation so the
                        // model can react; the loop itself keeps going.
                        warn!(user = %user, tool = %tc.name, error = %e, "Tool call failed");
                        events.emit(TurnEvent::ToolCallFailed {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            error: e.to_string(),
                        });
                        ToolResult::failure(&tc.id, e)
                    }
                };

                messages.push(Message::tool_result(&tc.id, tool_payload(&result)));
            }
        }

        let final_text = match final_text {
            Some(text) => text,
            None => {
                warn!(user = %user, rounds = self.max_rounds, "Tool budget exhausted, forcing finalization");
                TOOL_BUDGET_EXHAUSTED.to_string()
            }
        };

        // Persist before announcing: a failed write must yield an error
        // turn with no final_answer and no partial history.
        let exchange = vec![Message::user(user_message), Message::assistant(&final_text)];
        if let Err(e) = self.history.append_many(user, exchange).await {
            error!(user = %user, error = %e, "History write failed");
            events.emit(TurnEvent::Error {
                message: TURN_FAILED_APOLOGY.into(),
            });
            return Err(e.into());
        }

        events.emit(TurnEvent::MessageDelta {
            content: final_text.clone(),
        });
        events.emit(TurnEvent::FinalAnswer {
            content: final_text.clone(),
        });

        self.schedule_memory_update(user, user_message, &final_text);

        Ok(final_text)
    }

    /// Call the model, retrying timed-out calls a bounded number of times
    /// with doubling backoff. Other model errors abort immediately.
    async fn complete_with_retry(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, ModelError> {
        let mut attempt = 0;
        loop {
            match self.provider.complete(request.clone()).await {
                Err(ModelError::Timeout(reason)) if attempt < TIMEOUT_RETRIES => {
                    attempt += 1;
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Model call timed out, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Queue the turn summary for the background memory writer. Never
    /// awaited; trivial exchanges are skipped.
    fn schedule_memory_update(&self, user: &UserId, user_message: &str, answer: &str) {
        if user_message.len() < 10 || answer.len() < 10 {
            return;
        }
        let summary = format!("User asked: {user_message}\nAssistant answered: {answer}");
        self.updater.schedule(user, summary);
    }
}

/// What the model sees as the tool message body: structured data when the
/// tool produced it, the plain output line otherwise.
fn tool_payload(result: &ToolResult) -> String {
    match &result.data {
        Some(data) => data.to_string(),
        None => result.output.clone(),
    }
}
