//! The search collaborator behind both search tools.
//!
//! Both tools normalize their input into a `SearchRequest`, filter the hits
//! by relevance score, and deep-extract the top URLs for richer context.
//! The offline backend returns deterministic results so the agent loop can
//! be exercised end-to-end without network access.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wayfarer_core::error::ToolError;

/// Hits below this relevance score are discarded.
const MIN_SCORE: f32 = 0.2;

/// How many of the strongest hits get their page content extracted.
const EXTRACT_TOP: usize = 2;

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
    /// Restrict hits to these domains. Empty means open web.
    pub include_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageExtract {
    pub url: String,
    pub content: String,
}

/// Everything a search tool returns to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub extractions: Vec<PageExtract>,
}

/// The external search service.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ToolError>;

    /// Fetch full page content for the given URLs.
    async fn extract(&self, urls: &[String]) -> Result<Vec<PageExtract>, ToolError>;
}

/// Shared pipeline for both search tools: augment the query with travel
/// dates, filter weak hits, then deep-extract the top URLs. Extraction
/// failures degrade to an outcome without extractions.
pub async fn run_search(
    backend: &dyn SearchBackend,
    query: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
    max_results: usize,
    include_domains: Vec<String>,
) -> Result<SearchOutcome, ToolError> {
    let mut enhanced_query = query.to_string();
    if let Some(start) = start_date {
        enhanced_query.push_str(&format!(" from {start}"));
    }
    if let Some(end) = end_date {
        if start_date != Some(end) {
            enhanced_query.push_str(&format!(" to {end}"));
        }
    }

    let request = SearchRequest {
        query: enhanced_query.clone(),
        max_results,
        include_domains,
    };

    let all_hits = backend.search(&request).await?;
    let total = all_hits.len();
    let results: Vec<SearchHit> = all_hits.into_iter().filter(|h| h.score > MIN_SCORE).collect();
    debug!(
        backend = backend.name(),
        query = %enhanced_query,
        kept = results.len(),
        total,
        "Search results filtered by score"
    );

    let top_urls: Vec<String> = results.iter().take(EXTRACT_TOP).map(|h| h.url.clone()).collect();
    let extractions = if top_urls.is_empty() {
        Vec::new()
    } else {
        match backend.extract(&top_urls).await {
            Ok(extractions) => extractions,
            Err(e) => {
                warn!(error = %e, "URL extraction failed, continuing without page content");
                Vec::new()
            }
        }
    };

    Ok(SearchOutcome {
        query: enhanced_query,
        results,
        extractions,
    })
}

/// A deterministic offline backend. Hit URLs land on the requested domains
/// (or example.com for open searches) so domain restrictions are visible in
/// the output.
pub struct StaticSearchBackend;

#[async_trait]
impl SearchBackend for StaticSearchBackend {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, ToolError> {
        let domains: Vec<&str> = if request.include_domains.is_empty() {
            vec!["example.com"]
        } else {
            request.include_domains.iter().map(String::as_str).collect()
        };

        let hits = (0..request.max_results)
            .map(|i| {
                let domain = domains[i % domains.len()];
                SearchHit {
                    title: format!("Result {} for: {}", i + 1, request.query),
                    url: format!("https://{}/search?q={}&p={}", domain, urlencode(&request.query), i + 1),
                    snippet: format!("Summary of travel information matching '{}'.", request.query),
                    // Decaying scores so the low-relevance filter has teeth.
                    score: 0.9 - 0.15 * i as f32,
                }
            })
            .collect();

        Ok(hits)
    }

    async fn extract(&self, urls: &[String]) -> Result<Vec<PageExtract>, ToolError> {
        Ok(urls
            .iter()
            .map(|url| PageExtract {
                url: url.clone(),
                content: format!("Full page content for {url}."),
            })
            .collect())
    }
}

fn urlencode(s: &str) -> String {
    s.replace(' ', "+")
}
