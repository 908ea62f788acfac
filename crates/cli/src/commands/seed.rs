//! `wayfarer seed`: validate the seed file and report what it loads.

use std::path::Path;
use wayfarer_config::AppConfig;
use wayfarer_core::memory::MemoryStore;
use wayfarer_core::message::UserId;
use wayfarer_memory::{InMemoryStore, SeedData};

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let seed = SeedData::load(&config.paths.seed_file)?;
    if seed.user_memories.is_empty() {
        println!(
            "No seed data found at {}",
            config.paths.seed_file.display()
        );
        return Ok(());
    }

    // Dry-run against a scratch store to validate and count
    let store = InMemoryStore::new();
    let total = seed.seed_all(&store).await?;

    println!("Seed file: {}", config.paths.seed_file.display());
    println!("{total} insights across {} users:", seed.user_memories.len());
    for (user, insights) in &seed.user_memories {
        let count = store.count(&UserId::new(user.clone())).await?;
        println!("  {user}: {count} insights");
        for insight in insights {
            println!("    - {}", insight.insight);
        }
    }

    Ok(())
}
