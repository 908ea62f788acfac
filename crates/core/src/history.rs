//! Chat history store: the bounded recent-conversation tier.
//!
//! The store is append-only per user and exposes bounded-window reads.
//! Backends enforce the configured window: when an append would exceed it,
//! the oldest entries are evicted whole (never truncated mid-message).

use crate::error::StoreError;
use crate::message::{Message, UserId};
use async_trait::async_trait;

/// Per-user chat history with a bounded window.
///
/// Consistency contract: a user's own append is visible to their immediately
/// following read. No cross-user visibility under any call.
#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    /// The backend name (e.g., "in_memory", "redis").
    fn name(&self) -> &str;

    /// Append a single message to the user's history.
    async fn append(&self, user: &UserId, message: Message) -> Result<(), StoreError>;

    /// Append several messages as one unit: either all of them become
    /// visible or none do. The orchestration loop uses this to record a
    /// full exchange atomically.
    async fn append_many(&self, user: &UserId, messages: Vec<Message>) -> Result<(), StoreError>;

    /// Up to `limit` most recent messages, oldest-first. Empty if none exist.
    async fn recent(&self, user: &UserId, limit: usize) -> Result<Vec<Message>, StoreError>;

    /// Remove all history for this user only. Idempotent.
    async fn clear(&self, user: &UserId) -> Result<(), StoreError>;
}
