//! Tool trait and registry: the closed set of callables the model may request.
//!
//! Tools are what give the agent the ability to act: search travel logistics,
//! research destinations, and export calendar files. The registry is the
//! single dispatch table: it validates arguments against each tool's schema
//! before any executor code runs, and bounds execution with a timeout.

use crate::error::ToolError;
use crate::provider::ToolDefinition;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A request to execute a tool. Ephemeral: exists only within one loop
/// iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content (fed back to the model as a tool message)
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// A failed result carrying a human-readable cause. Tool-level failures
    /// are reported this way so the model can react instead of the loop
    /// crashing.
    pub fn failure(call_id: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self {
            call_id: call_id.into(),
            success: false,
            output: format!("Error: {cause}"),
            data: None,
        }
    }
}

/// The core Tool trait.
///
/// Each tool (search_logistics, search_general, generate_calendar_ics)
/// implements this trait and is registered in the ToolRegistry.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with already-validated arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// The registry of available tools.
///
/// The orchestration loop uses this to:
/// 1. Get tool definitions to send to the model
/// 2. Validate and execute tools when the model requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tools: HashMap::new(),
            timeout,
        }
    }

    /// Register a tool. Fails at startup if the name is already taken;
    /// the dispatch table is closed and validated before any turn runs.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::InvalidArguments(format!(
                "duplicate tool registration: {name}"
            )));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// All tool definitions, sorted by name for deterministic model input.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Validate and execute a tool call.
    ///
    /// Order of checks: unknown name → schema validation → bounded
    /// execution. Validation failures never reach the executor, so invalid
    /// input has no side effects.
    pub async fn invoke(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        validate_arguments(&tool.parameters_schema(), &call.arguments)?;

        let timeout_secs = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, tool.execute(call.arguments.clone())).await {
            Ok(Ok(mut result)) => {
                result.call_id = call.id.clone();
                Ok(result)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs,
            }),
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

/// Validate `arguments` against a JSON-Schema-shaped parameter spec.
///
/// Checks the subset our tool schemas use: top-level object, `required`
/// fields, primitive `type`s, and `format: "date"` fields which must parse
/// as a YYYY-MM-DD calendar date.
pub fn validate_arguments(
    schema: &serde_json::Value,
    arguments: &serde_json::Value,
) -> Result<(), ToolError> {
    let obj = arguments
        .as_object()
        .ok_or_else(|| ToolError::InvalidArguments("arguments must be a JSON object".into()))?;

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            if !obj.contains_key(field) || obj[field].is_null() {
                return Err(ToolError::InvalidArguments(format!(
                    "missing required field '{field}'"
                )));
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (field, spec) in properties {
        let Some(value) = obj.get(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }

        if let Some(expected) = spec.get("type").and_then(|t| t.as_str()) {
            let ok = match expected {
                "string" => value.is_string(),
                "integer" => value.is_i64() || value.is_u64(),
                "number" => value.is_number(),
                "boolean" => value.is_boolean(),
                "array" => value.is_array(),
                "object" => value.is_object(),
                _ => true,
            };
            if !ok {
                return Err(ToolError::InvalidArguments(format!(
                    "field '{field}' must be of type {expected}"
                )));
            }
        }

        if spec.get("format").and_then(|f| f.as_str()) == Some("date") {
            let text = value.as_str().unwrap_or_default();
            if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err() {
                return Err(ToolError::InvalidArguments(format!(
                    "field '{field}' must be a YYYY-MM-DD date, got '{text}'"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A simple test tool that records how many times it ran.
    struct EchoTool {
        executions: Arc<AtomicUsize>,
    }

    impl EchoTool {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let counter = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    executions: counter.clone(),
                },
                counter,
            )
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "when": { "type": "string", "format": "date" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            let text = arguments["text"].as_str().unwrap_or("").to_string();
            Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: text,
                data: None,
            })
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }
        fn description(&self) -> &str {
            "Never finishes in time"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn registry_with_echo() -> (ToolRegistry, Arc<AtomicUsize>) {
        let mut registry = ToolRegistry::new(Duration::from_secs(5));
        let (tool, counter) = EchoTool::new();
        registry.register(Box::new(tool)).unwrap();
        (registry, counter)
    }

    #[test]
    fn registry_register_and_lookup() {
        let (registry, _) = registry_with_echo();
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let mut registry = ToolRegistry::new(Duration::from_secs(5));
        let (a, _) = EchoTool::new();
        let (b, _) = EchoTool::new();
        registry.register(Box::new(a)).unwrap();
        let err = registry.register(Box::new(b)).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn invoke_executes_tool() {
        let (registry, counter) = registry_with_echo();
        let call = ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: serde_json::json!({"text": "hello"}),
        };
        let result = registry.invoke(&call).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "hello");
        assert_eq!(result.call_id, "call_1");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invoke_unknown_tool_never_executes() {
        let (registry, counter) = registry_with_echo();
        let call = ToolCall {
            id: "call_1".into(),
            name: "nonexistent".into(),
            arguments: serde_json::json!({}),
        };
        let err = registry.invoke(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invoke_missing_required_field_has_no_side_effects() {
        let (registry, counter) = registry_with_echo();
        let call = ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: serde_json::json!({}),
        };
        let err = registry.invoke(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invoke_rejects_bad_date_before_execution() {
        let (registry, counter) = registry_with_echo();
        let call = ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: serde_json::json!({"text": "hi", "when": "June 5th"}),
        };
        let err = registry.invoke(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invoke_times_out() {
        let mut registry = ToolRegistry::new(Duration::from_millis(20));
        registry.register(Box::new(SlowTool)).unwrap();
        let call = ToolCall {
            id: "call_1".into(),
            name: "slow".into(),
            arguments: serde_json::json!({}),
        };
        let err = registry.invoke(&call).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[test]
    fn validate_accepts_valid_date() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "date": { "type": "string", "format": "date" } },
            "required": ["date"]
        });
        assert!(validate_arguments(&schema, &serde_json::json!({"date": "2026-06-05"})).is_ok());
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        });
        let err = validate_arguments(&schema, &serde_json::json!({"query": 42})).unwrap_err();
        assert!(err.to_string().contains("query"));
    }

    #[test]
    fn definitions_sorted_by_name() {
        let (registry, _) = registry_with_echo();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }
}
