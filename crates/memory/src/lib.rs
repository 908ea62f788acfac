//! Memory backends for Wayfarer.
//!
//! Two tiers, both keyed by user id:
//! - chat history: bounded, ordered, append-only recent conversation
//! - long-term memory: durable traveler facts with relevance-ranked search
//!
//! Plus the machinery around them: seed loading (initial per-user insights)
//! and the background updater that writes post-turn insights without
//! blocking the next user turn.

pub mod history;
pub mod in_memory;
pub mod seed;
pub mod updater;

pub use history::InMemoryHistory;
pub use in_memory::InMemoryStore;
pub use seed::SeedData;
pub use updater::MemoryUpdater;
