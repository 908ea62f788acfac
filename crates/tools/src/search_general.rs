//! General destination research tool: open web, no domain restriction.

use crate::search::{run_search, SearchBackend};
use async_trait::async_trait;
use std::sync::Arc;
use wayfarer_core::error::ToolError;
use wayfarer_core::tool::{Tool, ToolResult};

pub struct SearchGeneralTool {
    backend: Arc<dyn SearchBackend>,
    max_results: usize,
}

impl SearchGeneralTool {
    pub fn new(backend: Arc<dyn SearchBackend>, max_results: usize) -> Self {
        Self { backend, max_results }
    }
}

#[async_trait]
impl Tool for SearchGeneralTool {
    fn name(&self) -> &str {
        "search_general"
    }

    fn description(&self) -> &str {
        "General destination research: activities, attractions, neighborhoods, dining, \
         events, and local tips. Provide a destination/time-focused query, e.g. \
         \"things to do in Lisbon in June\" or \"best neighborhoods to stay in Tokyo\". \
         Runs an open web search with no domain restriction."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let outcome = run_search(self.backend.as_ref(), query, None, None, self.max_results, vec![]).await?;

        let data = serde_json::to_value(&outcome)
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name().into(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: format!(
                "{} results + {} extractions",
                outcome.results.len(),
                outcome.extractions.len()
            ),
            data: Some(data),
        })
    }
}
