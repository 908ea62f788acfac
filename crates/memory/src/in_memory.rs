//! In-process long-term memory backend with keyword relevance ranking.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use wayfarer_core::error::MemoryError;
use wayfarer_core::memory::{MemoryRecord, MemoryStore, SeedInsight};
use wayfarer_core::message::UserId;

/// Stores each user's records in a Vec behind one lock. Useful for testing
/// and for running without an external memory service.
pub struct InMemoryStore {
    namespaces: Arc<RwLock<HashMap<UserId, Vec<MemoryRecord>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            namespaces: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Keyword overlap between the query terms and the insight text, normalized
/// by insight length so short precise facts outrank rambling ones.
fn relevance(query: &str, insight: &str) -> f32 {
    let insight_lower = insight.to_lowercase();
    let hits: usize = query
        .to_lowercase()
        .split_whitespace()
        .filter(|term| term.len() > 2)
        .filter(|term| insight_lower.contains(*term))
        .count();
    hits as f32 / (insight.len() as f32 / 100.0).max(1.0)
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(
        &self,
        user: &UserId,
        query: &str,
        k: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let namespaces = self.namespaces.read().await;
        let Some(records) = namespaces.get(user) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<MemoryRecord> = records
            .iter()
            .cloned()
            .map(|mut r| {
                r.score = relevance(query, &r.insight);
                r
            })
            .filter(|r| r.score > 0.0)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }

    async fn remember(
        &self,
        user: &UserId,
        insight: &str,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<String, MemoryError> {
        let record = MemoryRecord {
            id: Uuid::new_v4().to_string(),
            insight: insight.to_string(),
            metadata: metadata.unwrap_or_default(),
            created_at: Utc::now(),
            score: 0.0,
        };
        let id = record.id.clone();
        self.namespaces
            .write()
            .await
            .entry(user.clone())
            .or_default()
            .push(record);
        Ok(id)
    }

    async fn seed(&self, user: &UserId, insights: &[SeedInsight]) -> Result<usize, MemoryError> {
        let mut namespaces = self.namespaces.write().await;
        let records = namespaces.entry(user.clone()).or_default();
        if !records.is_empty() {
            // Already populated, keep the existing namespace untouched.
            return Ok(0);
        }
        for seed in insights {
            records.push(MemoryRecord {
                id: Uuid::new_v4().to_string(),
                insight: seed.insight.clone(),
                metadata: seed.metadata.clone(),
                created_at: Utc::now(),
                score: 0.0,
            });
        }
        Ok(insights.len())
    }

    async fn count(&self, user: &UserId) -> Result<usize, MemoryError> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces.get(user).map_or(0, Vec::len))
    }

    async fn clear(&self, user: &UserId) -> Result<(), MemoryError> {
        self.namespaces.write().await.remove(user);
        Ok(())
    }
}
