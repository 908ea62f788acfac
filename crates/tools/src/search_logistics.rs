//! Logistics search tool: flights, hotels, and intercity transport.

use crate::search::{run_search, SearchBackend};
use async_trait::async_trait;
use std::sync::Arc;
use wayfarer_core::error::ToolError;
use wayfarer_core::tool::{Tool, ToolResult};

/// Reputable flight/hotel/transport providers and aggregators.
const LOGISTICS_DOMAINS: [&str; 5] = [
    // Flights / OTAs
    "expedia.com",
    "kayak.com",
    "travel.google.com",
    // Hotels / stays
    "booking.com",
    "hotels.com",
];

pub struct SearchLogisticsTool {
    backend: Arc<dyn SearchBackend>,
    max_results: usize,
}

impl SearchLogisticsTool {
    pub fn new(backend: Arc<dyn SearchBackend>, max_results: usize) -> Self {
        Self { backend, max_results }
    }
}

#[async_trait]
impl Tool for SearchLogisticsTool {
    fn name(&self) -> &str {
        "search_logistics"
    }

    fn description(&self) -> &str {
        "Logistics search: flights, hotels, and intercity transport only. \
         Provide a concise query with the route or destination and constraints, \
         e.g. \"JFK to LHR, nonstop preferred\" or \"hotels in Kyoto near Gion, mid-range\". \
         Optionally include start_date and end_date (YYYY-MM-DD) to guide availability windows. \
         Results are restricted to reputable flight/hotel/transport sources; top URLs are deeply extracted."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Route or destination plus constraints"
                },
                "start_date": {
                    "type": "string",
                    "format": "date",
                    "description": "Trip start date (YYYY-MM-DD)"
                },
                "end_date": {
                    "type": "string",
                    "format": "date",
                    "description": "Trip end date (YYYY-MM-DD)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let start_date = arguments["start_date"].as_str();
        let end_date = arguments["end_date"].as_str();

        let outcome = run_search(
            self.backend.as_ref(),
            query,
            start_date,
            end_date,
            self.max_results,
            LOGISTICS_DOMAINS.iter().map(|d| d.to_string()).collect(),
        )
        .await?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::StaticSearchBackend;

    fn tool() -> SearchLogisticsTool {
        SearchLogisticsTool::new(Arc::new(StaticSearchBackend), 5)
    }

    #[tokio::test]
    async fn restricts_to_logistics_domains() {
        let result = tool()
            .execute(serde_json::json!({"query": "train Paris to Amsterdam"}))
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        let results = data["results"].as_array().unwrap();
        assert!(!results.is_empty());
        for hit in results {
            let url = hit["url"].as_str().unwrap();
            assert!(LOGISTICS_DOMAINS.iter().any(|d| url.contains(d)), "unexpected domain in {url}");
        }
    }

    #[tokio::test]
    async fn dates_flow_into_the_query() {
        let result = tool()
            .execute(serde_json::json!({
                "query": "hotels in Kyoto",
                "start_date": "2026-09-10",
                "end_date": "2026-09-14"
            }))
            .await
            .unwrap();

        let data = result.data.unwrap();
        assert_eq!(data["query"], "hotels in Kyoto from 2026-09-10 to 2026-09-14");
    }

    #[tokio::test]
    async fn missing_query_is_rejected() {
        let result = tool().execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn definition_declares_date_formats() {
        let def = tool().to_definition();
        assert_eq!(def.name, "search_logistics");
        assert_eq!(def.parameters["properties"]["start_date"]["format"], "date");
        assert_eq!(def.parameters["required"][0], "query");
    }
}
