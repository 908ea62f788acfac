//! Per-user sessions and the manager that caches them.
//!
//! A session binds a user to their tool registry, agent loop, and event
//! stream. Users are fully independent: concurrent turns for different
//! users never contend on anything but the shared stores, which are
//! Send + Sync and keyed by user.

use crate::assembler::ContextAssembler;
use crate::loop_runner::AgentLoop;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;
use wayfarer_config::AppConfig;
use wayfarer_core::error::Error;
use wayfarer_core::event::{EventSink, SequencedEvent};
use wayfarer_core::history::ChatHistoryStore;
use wayfarer_core::memory::MemoryStore;
use wayfarer_core::message::UserId;
use wayfarer_core::provider::Provider;
use wayfarer_memory::MemoryUpdater;
use wayfarer_tools::{registry_for_user, SearchBackend};

/// One user's conversation surface.
pub struct Session {
    user: UserId,
    agent: AgentLoop,
    events: EventSink,
    receiver: Mutex<Option<mpsc::Receiver<SequencedEvent>>>,
}

impl Session {
    /// Run one turn and return the final answer.
    pub async fn send(&self, user_message: &str) -> Result<String, Error> {
        self.agent.run_turn(&self.user, user_message, &self.events).await
    }

    /// Take the observer end of this session's event stream. Single
    /// consumer: the first caller gets it, later calls get None.
    pub fn take_events(&self) -> Option<mpsc::Receiver<SequencedEvent>> {
        match self.receiver.lock() {
            Ok(mut receiver) => receiver.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }
}

/// Builds and caches sessions, one per user.
pub struct SessionManager {
    config: AppConfig,
    provider: Arc<dyn Provider>,
    history: Arc<dyn ChatHistoryStore>,
    memory: Arc<dyn MemoryStore>,
    search: Arc<dyn SearchBackend>,
    updater: MemoryUpdater,
    sessions: Mutex<HashMap<UserId, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn Provider>,
        history: Arc<dyn ChatHistoryStore>,
        memory: Arc<dyn MemoryStore>,
        search: Arc<dyn SearchBackend>,
    ) -> Self {
        let updater = MemoryUpdater::new(memory.clone());
        Self {
            config,
            provider,
            history,
            memory,
            search,
            updater,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Get the user's session, creating it on first use.
    pub fn open(&self, user: &UserId) -> Result<Arc<Session>, Error> {
        {
            let sessions = match self.sessions.lock() {
                Ok(sessions) => sessions,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(session) = sessions.get(user) {
                return Ok(session.clone());
            }
        }

        let session = Arc::new(self.build_session(user)?);
        let mut sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(sessions.entry(user.clone()).or_insert(session).clone())
    }

    /// Waits for queued memory writes to be attempted. For shutdown.
    pub async fn flush_memory_updates(&self) {
        self.updater.wait_idle().await;
    }

    fn build_session(&self, user: &UserId) -> Result<Session, Error> {
        debug!(user = %user, "Creating session");
        let registry = Arc::new(registry_for_user(&self.config, self.search.clone(), user)?);
        let assembler = ContextAssembler::new(
            self.history.clone(),
            self.memory.clone(),
            self.config.agent.max_history_messages,
            self.config.agent.recall_limit,
        );
        let agent = AgentLoop::new(
            self.provider.clone(),
            self.config.model.name.clone(),
            self.config.model.temperature,
            registry,
            assembler,
            self.history.clone(),
            self.updater.clone(),
        )
        .with_max_rounds(self.config.agent.max_tool_rounds)
        .with_max_tokens(self.config.model.max_tokens);

        let (events, receiver) = EventSink::channel(self.config.agent.event_buffer);
        Ok(Session {
            user: user.clone(),
            agent,
            events,
            receiver: Mutex::new(Some(receiver)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_memory::{InMemoryHistory, InMemoryStore};
    use wayfarer_providers::ScriptedProvider;
    use wayfarer_tools::StaticSearchBackend;

    fn manager(config: AppConfig) -> SessionManager {
        SessionManager::new(
            config,
            Arc::new(ScriptedProvider::always("Here's your plan.")),
            Arc::new(InMemoryHistory::new(40)),
            Arc::new(InMemoryStore::new()),
            Arc::new(StaticSearchBackend),
        )
    }

    fn test_config(tmp: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.paths.calendar_dir = tmp.join("calendars");
        config
    }

    #[tokio::test]
    async fn open_is_idempotent_per_user() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(test_config(tmp.path()));
        let alice = UserId::from("alice");

        let first = manager.open(&alice).unwrap();
        let second = manager.open(&alice).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn event_receiver_is_taken_once() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(test_config(tmp.path()));
        let session = manager.open(&UserId::from("alice")).unwrap();

        assert!(session.take_events().is_some());
        assert!(session.take_events().is_none());
    }

    #[tokio::test]
    async fn concurrent_users_get_independent_turns() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = Arc::new(manager(test_config(tmp.path())));

        let alice = manager.open(&UserId::from("alice")).unwrap();
        let bob = manager.open(&UserId::from("bob")).unwrap();

        let (a, b) = tokio::join!(
            alice.send("Plan Lisbon for me"),
            bob.send("Plan Tokyo for me")
        );
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_ne!(alice.user(), bob.user());
    }

    #[tokio::test]
    async fn session_turn_streams_events() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager(test_config(tmp.path()));
        let session = manager.open(&UserId::from("alice")).unwrap();
        let mut events = session.take_events().unwrap();

        session.send("Where to in June?").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event.event.event_type().to_string());
        }
        assert_eq!(kinds.first().map(String::as_str), Some("thinking"));
        assert_eq!(kinds.last().map(String::as_str), Some("final_answer"));
    }
}
