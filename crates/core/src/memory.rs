//! Long-term memory store: durable traveler facts with semantic retrieval.
//!
//! Each user owns a memory namespace. Records are created at seed time or by
//! the asynchronous update step after a conversation turn. Retrieval returns
//! a ranked subset by relevance to the current query; the ranking algorithm
//! is delegated to the backend.

use crate::error::MemoryError;
use crate::message::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A durable fact about a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique ID for this record
    pub id: String,

    /// The insight text (e.g., "Prefers boutique hotels")
    pub insight: String,

    /// Optional structured metadata (source, tags, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// When this record was created
    pub created_at: DateTime<Utc>,

    /// Relevance score (set by search operations)
    #[serde(default)]
    pub score: f32,
}

/// A seed insight loaded from the static seed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedInsight {
    pub insight: String,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The long-term memory backend.
///
/// Callers must treat `search` as fail-open: a degraded backend returns an
/// error, and the orchestration loop proceeds with no memory content rather
/// than failing the turn.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "mem0").
    fn name(&self) -> &str;

    /// Return at most `k` records ranked by descending relevance to `query`.
    async fn search(
        &self,
        user: &UserId,
        query: &str,
        k: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// Store a new insight in the user's namespace.
    async fn remember(
        &self,
        user: &UserId,
        insight: &str,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<String, MemoryError>;

    /// Seed a user's namespace with initial insights. Idempotent across
    /// restarts: a namespace that already holds records is left untouched.
    async fn seed(&self, user: &UserId, insights: &[SeedInsight]) -> Result<usize, MemoryError>;

    /// Number of records in the user's namespace.
    async fn count(&self, user: &UserId) -> Result<usize, MemoryError>;

    /// Remove all records for this user only. Idempotent.
    async fn clear(&self, user: &UserId) -> Result<(), MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_record_serialization() {
        let record = MemoryRecord {
            id: "mem_001".into(),
            insight: "Prefers boutique hotels".into(),
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
            score: 0.91,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("boutique hotels"));
    }

    #[test]
    fn seed_insight_deserializes_without_metadata() {
        let insight: SeedInsight =
            serde_json::from_str(r#"{"insight": "Travels with two kids"}"#).unwrap();
        assert_eq!(insight.insight, "Travels with two kids");
        assert!(insight.metadata.is_empty());
    }
}
