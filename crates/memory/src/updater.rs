//! Background memory updates.
//!
//! After a turn completes, the orchestration loop hands the turn summary to
//! the updater and moves on. Writes happen on a spawned task so the next
//! user turn is never blocked on the memory service. Per user there is at
//! most one worker in flight; summaries scheduled while it runs join its
//! backlog rather than spawning a second writer.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use wayfarer_core::memory::MemoryStore;
use wayfarer_core::message::UserId;

#[derive(Default)]
struct UserQueue {
    in_flight: bool,
    backlog: VecDeque<String>,
}

/// Fire-and-forget writer for post-turn insights.
///
/// Failures are logged and never surfaced to the user: a degraded memory
/// service must not fail conversation turns.
#[derive(Clone)]
pub struct MemoryUpdater {
    store: Arc<dyn MemoryStore>,
    queues: Arc<Mutex<HashMap<UserId, UserQueue>>>,
}

impl MemoryUpdater {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            queues: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue an insight for the user and return immediately. Spawns a worker
    /// unless one is already draining this user's backlog.
    pub fn schedule(&self, user: &UserId, insight: String) {
        let spawn_worker = {
            let mut queues = match self.queues.lock() {
                Ok(queues) => queues,
                Err(poisoned) => poisoned.into_inner(),
            };
            let queue = queues.entry(user.clone()).or_default();
            queue.backlog.push_back(insight);
            if queue.in_flight {
                false
            } else {
                queue.in_flight = true;
                true
            }
        };

        if spawn_worker {
            let updater = self.clone();
            let user = user.clone();
            tokio::spawn(async move {
                updater.drain(user).await;
            });
        }
    }

    /// Process the user's backlog until it is empty, then mark the worker
    /// done. Pop and the idle transition happen under the same lock so a
    /// concurrent `schedule` either lands in this backlog or spawns the
    /// next worker, never neither.
    async fn drain(&self, user: UserId) {
        loop {
            let next = {
                let mut queues = match self.queues.lock() {
                    Ok(queues) => queues,
                    Err(poisoned) => poisoned.into_inner(),
                };
                match queues.get_mut(&user) {
                    Some(queue) => match queue.backlog.pop_front() {
                        Some(insight) => Some(insight),
                        None => {
                            queues.remove(&user);
                            None
                        }
                    },
                    None => None,
                }
            };

            let Some(insight) = next else {
                return;
            };

            let mut metadata = serde_json::Map::new();
            metadata.insert(
                "source".into(),
                serde_json::Value::String("conversation".into()),
            );
            match self.store.remember(&user, &insight, Some(metadata)).await {
                Ok(id) => debug!(user = %user, memory_id = %id, "Stored turn insight"),
                Err(e) => warn!(user = %user, error = %e, "Memory update failed, dropping insight"),
            }
        }
    }

    /// True while any user has a worker in flight or a non-empty backlog.
    pub fn is_busy(&self) -> bool {
        let queues = match self.queues.lock() {
            Ok(queues) => queues,
            Err(poisoned) => poisoned.into_inner(),
        };
        !queues.is_empty()
    }

    /// Wait until every scheduled update has been attempted. Test helper,
    /// also used for graceful shutdown.
    pub async fn wait_idle(&self) {
        while self.is_busy() {
            tokio::task::yield_now().await;
        }
    }
}
