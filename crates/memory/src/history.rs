//! In-process chat history backend with a bounded per-user window.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use wayfarer_core::error::StoreError;
use wayfarer_core::history::ChatHistoryStore;
use wayfarer_core::message::{Message, UserId};

/// Per-user ring of recent messages. When an append would exceed the window,
/// the oldest entries are evicted whole.
pub struct InMemoryHistory {
    window: usize,
    logs: Arc<RwLock<HashMap<UserId, VecDeque<Message>>>>,
}

impl InMemoryHistory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            logs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn push_bounded(&self, log: &mut VecDeque<Message>, message: Message) {
        log.push_back(message);
        while log.len() > self.window {
            log.pop_front();
        }
    }
}

#[async_trait]
impl ChatHistoryStore for InMemoryHistory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, user: &UserId, message: Message) -> Result<(), StoreError> {
        let mut logs = self.logs.write().await;
        let log = logs.entry(user.clone()).or_default();
        self.push_bounded(log, message);
        Ok(())
    }

    async fn append_many(&self, user: &UserId, messages: Vec<Message>) -> Result<(), StoreError> {
        // Single lock acquisition: either every message lands or none does.
        let mut logs = self.logs.write().await;
        let log = logs.entry(user.clone()).or_default();
        for message in messages {
            self.push_bounded(log, message);
        }
        Ok(())
    }

    async fn recent(&self, user: &UserId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let logs = self.logs.read().await;
        let Some(log) = logs.get(user) else {
            return Ok(Vec::new());
        };
        let skip = log.len().saturating_sub(limit);
        Ok(log.iter().skip(skip).cloned().collect())
    }

    async fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        self.logs.write().await.remove(user);
        Ok(())
    }
}
