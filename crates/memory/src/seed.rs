//! Seed data loading.
//!
//! The seed file maps user ids to the insights their memory namespace should
//! start with. Seeding runs at startup and is idempotent: users whose
//! namespace already holds records are skipped by the backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use wayfarer_core::error::MemoryError;
use wayfarer_core::memory::{MemoryStore, SeedInsight};
use wayfarer_core::message::UserId;

/// Parsed contents of the seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    /// User id to initial insights. BTreeMap for deterministic seed order.
    #[serde(default)]
    pub user_memories: BTreeMap<String, Vec<SeedInsight>>,
}

impl SeedData {
    /// Load seed data from a JSON file. A missing file yields empty seed
    /// data, not an error: running without seeds is a supported mode.
    pub fn load(path: &Path) -> Result<Self, MemoryError> {
        if !path.exists() {
            debug!(path = %path.display(), "No seed file found, starting with empty memories");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MemoryError::Unavailable(format!("failed to read seed file: {e}")))?;
        serde_json::from_str(&raw)
            .map_err(|e| MemoryError::Unavailable(format!("failed to parse seed file: {e}")))
    }

    /// Seed every user's namespace, tagging each insight with its origin.
    /// Returns the total number of records written.
    pub async fn seed_all(&self, store: &dyn MemoryStore) -> Result<usize, MemoryError> {
        let mut total = 0;
        for (user, insights) in &self.user_memories {
            let user = UserId::new(user.clone());
            let tagged: Vec<SeedInsight> = insights
                .iter()
                .map(|seed| {
                    let mut metadata = seed.metadata.clone();
                    metadata
                        .entry("source".to_string())
                        .or_insert_with(|| serde_json::Value::String("seed".into()));
                    SeedInsight {
                        insight: seed.insight.clone(),
                        metadata,
                    }
                })
                .collect();

            let added = store.seed(&user, &tagged).await?;
            if added > 0 {
                info!(user = %user, count = added, "Seeded user memories");
            }
            total += added;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryStore;

    const SEED_JSON: &str = r#"{
        "user_memories": {
            "alice": [
                {"insight": "Prefers boutique hotels"},
                {"insight": "Vegetarian, needs meal options", "metadata": {"topic": "food"}}
            ],
            "bob": [
                {"insight": "Travels with two kids"}
            ]
        }
    }"#;

    #[tokio::test]
    async fn load_and_seed_all() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("seed.json");
        std::fs::write(&path, SEED_JSON).unwrap();

        let seed = SeedData::load(&path).unwrap();
        assert_eq!(seed.user_memories.len(), 2);

        let store = InMemoryStore::new();
        let total = seed.seed_all(&store).await.unwrap();
        assert_eq!(total, 3);

        let alice = UserId::from("alice");
        assert_eq!(store.count(&alice).await.unwrap(), 2);

        let results = store.search(&alice, "boutique hotels", 5).await.unwrap();
        assert_eq!(results[0].insight, "Prefers boutique hotels");
        assert_eq!(results[0].metadata["source"], "seed");
    }

    #[tokio::test]
    async fn seed_all_is_idempotent() {
        let seed: SeedData = serde_json::from_str(SEED_JSON).unwrap();
        let store = InMemoryStore::new();

        assert_eq!(seed.seed_all(&store).await.unwrap(), 3);
        assert_eq!(seed.seed_all(&store).await.unwrap(), 0);
        assert_eq!(store.count(&UserId::from("bob")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn existing_metadata_source_is_kept() {
        let raw = r#"{"user_memories": {"carol": [
            {"insight": "Enjoys night trains", "metadata": {"source": "import"}}
        ]}}"#;
        let seed: SeedData = serde_json::from_str(raw).unwrap();
        let store = InMemoryStore::new();
        seed.seed_all(&store).await.unwrap();

        let results = store
            .search(&UserId::from("carol"), "night trains", 5)
            .await
            .unwrap();
        assert_eq!(results[0].metadata["source"], "import");
    }

    #[test]
    fn missing_file_yields_empty_seed() {
        let seed = SeedData::load(Path::new("/nonexistent/seed.json")).unwrap();
        assert!(seed.user_memories.is_empty());
    }
}
