//! Error types for the Wayfarer domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. The propagation policy:
//! tool-level errors are folded back into the conversation as failed tool
//! results; store and model errors abort the turn.

use thiserror::Error;

/// The top-level error type for all Wayfarer operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("History store error: {0}")]
    Store(#[from] StoreError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures from the model collaborator. The orchestration loop treats every
/// variant the same way: the turn aborts with a single error event and no
/// partial history write.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("Rate limited by model provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Model request timed out: {0}")]
    Timeout(String),

    #[error("Model API error (status {status_code}): {message}")]
    Api { status_code: u16, message: String },
}

/// Failures from the chat-history backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

/// Failures from the long-term memory backend.
///
/// Search failures are fail-open at the call site (missing long-term context
/// must never block a turn); update failures are logged and never surfaced.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Memory store unavailable: {0}")]
    Unavailable(String),

    #[error("Memory search failed: {0}")]
    SearchFailed(String),

    #[error("Memory update failed: {0}")]
    UpdateFailed(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_displays_correctly() {
        let err = Error::Model(ModelError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::ExecutionFailed {
            tool_name: "search_logistics".into(),
            reason: "upstream timeout".into(),
        });
        assert!(err.to_string().contains("search_logistics"));
        assert!(err.to_string().contains("upstream timeout"));
    }

    #[test]
    fn unknown_tool_names_the_tool() {
        let err = ToolError::UnknownTool("book_rocket".into());
        assert!(err.to_string().contains("book_rocket"));
    }
}
