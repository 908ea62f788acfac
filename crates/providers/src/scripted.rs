//! A scripted provider for tests and offline demos.
//!
//! Returns a fixed sequence of assistant messages, one per `complete` call.
//! Once the script runs out it keeps returning the last message, so a loop
//! that calls the model after the scripted tool rounds still terminates.

use async_trait::async_trait;
use std::sync::Mutex;
use wayfarer_core::error::ModelError;
use wayfarer_core::message::{Message, MessageToolCall};
use wayfarer_core::provider::{Provider, ProviderRequest, ProviderResponse};

pub struct ScriptedProvider {
    script: Mutex<Vec<Message>>,
    calls: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    /// A provider that plays back `script` in order, then repeats the final
    /// entry.
    pub fn new(script: Vec<Message>) -> Self {
        let mut script = script;
        script.reverse(); // pop from the back
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always answers with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![Message::assistant(text)])
    }

    /// Convenience: an assistant message requesting a single tool call.
    pub fn tool_call_message(call_id: &str, name: &str, arguments: serde_json::Value) -> Message {
        let mut message = Message::assistant("");
        message.tool_calls = vec![MessageToolCall {
            id: call_id.into(),
            name: name.into(),
            arguments: arguments.to_string(),
        }];
        message
    }

    /// Requests received so far, in order.
    pub fn recorded_requests(&self) -> Vec<ProviderRequest> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ModelError> {
        match self.calls.lock() {
            Ok(mut calls) => calls.push(request.clone()),
            Err(poisoned) => poisoned.into_inner().push(request.clone()),
        }

        let mut script = match self.script.lock() {
            Ok(script) => script,
            Err(poisoned) => poisoned.into_inner(),
        };
        let message = if script.len() > 1 {
            match script.pop() {
                Some(message) => message,
                None => Message::assistant(""),
            }
        } else {
            match script.last() {
                Some(message) => message.clone(),
                None => {
                    return Err(ModelError::MalformedResponse(
                        "scripted provider has no responses".into(),
                    ))
                }
            }
        };

        Ok(ProviderResponse {
            message,
            model: request.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "test-model".into(),
            messages: vec![Message::user("hello")],
            temperature: 0.0,
            max_tokens: None,
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn plays_script_in_order_then_repeats_last() {
        let provider = ScriptedProvider::new(vec![
            Message::assistant("first"),
            Message::assistant("second"),
        ]);

        assert_eq!(provider.complete(request()).await.unwrap().message.content, "first");
        assert_eq!(provider.complete(request()).await.unwrap().message.content, "second");
        assert_eq!(provider.complete(request()).await.unwrap().message.content, "second");
    }

    #[tokio::test]
    async fn records_requests() {
        let provider = ScriptedProvider::always("ok");
        provider.complete(request()).await.unwrap();
        provider.complete(request()).await.unwrap();
        assert_eq!(provider.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn tool_call_message_shape() {
        let message = ScriptedProvider::tool_call_message(
            "call_1",
            "search_general",
            serde_json::json!({"query": "Lisbon"}),
        );
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].name, "search_general");
    }
}
