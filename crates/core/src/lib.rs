//! # Wayfarer Core
//!
//! Domain types, traits, and error definitions for the Wayfarer
//! travel-concierge agent runtime. This crate defines the domain model that
//! all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (chat history, long-term memory, the model, the
//! search backend) is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod history;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ModelError, Result, StoreError, ToolError};
pub use event::{EventSink, SequencedEvent, TurnEvent};
pub use history::ChatHistoryStore;
pub use memory::{MemoryRecord, MemoryStore, SeedInsight};
pub use message::{Message, MessageToolCall, Role, UserId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
