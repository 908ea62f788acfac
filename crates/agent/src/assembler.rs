//! Context assembly for a single turn.
//!
//! Fixed order: system prompt (with the traveler profile folded in), then
//! the windowed chat history oldest-first, then the incoming user message.
//! Long-term memory is fail-open here: a degraded memory store costs the
//! turn its personalization, never the turn itself.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use wayfarer_core::error::StoreError;
use wayfarer_core::history::ChatHistoryStore;
use wayfarer_core::memory::{MemoryRecord, MemoryStore};
use wayfarer_core::message::{Message, UserId};

pub struct ContextAssembler {
    history: Arc<dyn ChatHistoryStore>,
    memory: Arc<dyn MemoryStore>,
    /// Chat-history window size in messages
    window: usize,
    /// Maximum insights recalled per turn
    recall_limit: usize,
}

impl ContextAssembler {
    pub fn new(
        history: Arc<dyn ChatHistoryStore>,
        memory: Arc<dyn MemoryStore>,
        window: usize,
        recall_limit: usize,
    ) -> Self {
        Self {
            history,
            memory,
            window,
            recall_limit,
        }
    }

    /// Build the ordered message sequence for one model call.
    ///
    /// The incoming user message is part of the assembled context but is NOT
    /// written to history here; persistence happens once, atomically, when
    /// the turn completes.
    pub async fn assemble(
        &self,
        user: &UserId,
        user_message: &str,
    ) -> Result<Vec<Message>, StoreError> {
        let insights = self.recall(user, user_message).await;

        let mut system = system_prompt();
        if !insights.is_empty() {
            system.push_str("\n\n## Traveler profile\n");
            for record in &insights {
                system.push_str(&format!("- {}\n", record.insight));
            }
        }

        let recent = self.history.recent(user, self.window).await?;
        debug!(
            user = %user,
            history = recent.len(),
            insights = insights.len(),
            "Assembled turn context"
        );

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::system(system));
        messages.extend(recent);
        messages.push(Message::user(user_message));
        Ok(messages)
    }

    async fn recall(&self, user: &UserId, query: &str) -> Vec<MemoryRecord> {
        match self.memory.search(user, query, self.recall_limit).await {
            Ok(records) => records,
            Err(e) => {
                warn!(user = %user, error = %e, "Memory recall failed, proceeding without insights");
                Vec::new()
            }
        }
    }
}

/// The travel concierge system prompt, stamped with today's UTC date.
fn system_prompt() -> String {
    let today = Utc::now().format("%Y-%m-%d");
    format!(
        "You are an expert, time-aware, friendly travel concierge. Today is {today} (UTC). \
         Assume your built-in knowledge may be outdated; for anything time-sensitive, verify with tools.\n\
         \n\
         ROLE:\n\
         - Discover destinations, plan itineraries, recommend accommodations, and organize logistics for the user.\n\
         - Research current options, prices, availability, and on-the-ground activities using your tools.\n\
         - Produce clear, actionable itineraries and booking guidance.\n\
         \n\
         TOOL USAGE:\n\
         - Use search_logistics ONLY for flights, hotels, or transport. Include start_date/end_date (YYYY-MM-DD) when known.\n\
         - Use search_general for activities, attractions, neighborhoods, dining, events, or local tips.\n\
         - Use generate_calendar_ics when you have a finalized itinerary. Pass a simple events array with title, date, and optional times/location/notes.\n\
         - Pass explicit dates to tools whenever the user provides a time window.\n\
         \n\
         OUTPUT STYLE:\n\
         - Be concise and prescriptive with suggestions, follow-ups, and recommendations.\n\
         - Cite sources with titles and URLs for any tool-based claim.\n\
         - For itineraries, list day-by-day with times and logistics.\n\
         \n\
         MEMORY:\n\
         - Consider the traveler profile below (long-term memory) before answering and adapt to it.\n\
         - Treat current session state as priority over remembered insights since it is current."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wayfarer_core::error::MemoryError;
    use wayfarer_core::memory::SeedInsight;
    use wayfarer_core::message::Role;
    use wayfarer_memory::{InMemoryHistory, InMemoryStore};

    fn alice() -> UserId {
        UserId::from("alice")
    }

    fn assembler(
        history: Arc<dyn ChatHistoryStore>,
        memory: Arc<dyn MemoryStore>,
    ) -> ContextAssembler {
        ContextAssembler::new(history, memory, 40, 5)
    }

    #[tokio::test]
    async fn order_is_system_history_user() {
        let history = Arc::new(InMemoryHistory::new(40));
        history.append(&alice(), Message::user("earlier question")).await.unwrap();
        history
            .append(&alice(), Message::assistant("earlier answer"))
            .await
            .unwrap();

        let messages = assembler(history, Arc::new(InMemoryStore::new()))
            .assemble(&alice(), "new question")
            .await
            .unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "earlier question");
        assert_eq!(messages[2].content, "earlier answer");
        assert_eq!(messages[3].content, "new question");
        assert_eq!(messages[3].role, Role::User);
    }

    #[tokio::test]
    async fn recalled_insight_appears_verbatim_in_system_message() {
        let memory = Arc::new(InMemoryStore::new());
        memory
            .remember(&alice(), "Prefers boutique hotels", None)
            .await
            .unwrap();

        let messages = assembler(Arc::new(InMemoryHistory::new(40)), memory)
            .assemble(&alice(), "find me boutique hotels in Lisbon")
            .await
            .unwrap();

        assert!(messages[0].content.contains("Traveler profile"));
        assert!(messages[0].content.contains("Prefers boutique hotels"));
    }

    #[tokio::test]
    async fn another_users_insights_stay_out() {
        let memory = Arc::new(InMemoryStore::new());
        memory
            .remember(&UserId::from("bob"), "Prefers boutique hotels", None)
            .await
            .unwrap();

        let messages = assembler(Arc::new(InMemoryHistory::new(40)), memory)
            .assemble(&alice(), "boutique hotels please")
            .await
            .unwrap();

        assert!(!messages[0].content.contains("boutique"));
    }

    struct DownMemory;

    #[async_trait]
    impl MemoryStore for DownMemory {
        fn name(&self) -> &str {
            "down"
        }

        async fn search(
            &self,
            _user: &UserId,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<MemoryRecord>, MemoryError> {
            Err(MemoryError::Unavailable("connection refused".into()))
        }

        async fn remember(
            &self,
            _user: &UserId,
            _insight: &str,
            _metadata: Option<serde_json::Map<String, serde_json::Value>>,
        ) -> Result<String, MemoryError> {
            Err(MemoryError::Unavailable("connection refused".into()))
        }

        async fn seed(
            &self,
            _user: &UserId,
            _insights: &[SeedInsight],
        ) -> Result<usize, MemoryError> {
            Err(MemoryError::Unavailable("connection refused".into()))
        }

        async fn count(&self, _user: &UserId) -> Result<usize, MemoryError> {
            Err(MemoryError::Unavailable("connection refused".into()))
        }

        async fn clear(&self, _user: &UserId) -> Result<(), MemoryError> {
            Err(MemoryError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn degraded_memory_still_assembles() {
        let messages = assembler(Arc::new(InMemoryHistory::new(40)), Arc::new(DownMemory))
            .assemble(&alice(), "plan a trip")
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert!(!messages[0].content.contains("Traveler profile"));
    }

    #[tokio::test]
    async fn window_limits_history_in_context() {
        let history = Arc::new(InMemoryHistory::new(40));
        for i in 0..10 {
            history
                .append(&alice(), Message::user(format!("msg {i}")))
                .await
                .unwrap();
        }

        let assembler = ContextAssembler::new(
            history,
            Arc::new(InMemoryStore::new()),
            4, // window smaller than stored history
            5,
        );
        let messages = assembler.assemble(&alice(), "latest").await.unwrap();

        // system + 4 windowed + user
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[1].content, "msg 6");
    }

    #[test]
    fn system_prompt_carries_todays_date() {
        let prompt = system_prompt();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        assert!(prompt.contains(&today));
        assert!(prompt.contains("travel concierge"));
    }
}
