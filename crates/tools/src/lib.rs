//! Built-in travel tools for Wayfarer.
//!
//! Three tools back the concierge: logistics search (flights, hotels,
//! transport), general destination research, and calendar generation.
//! The calendar tool writes per-user files, so registries are built per
//! user rather than shared.

pub mod calendar_ics;
pub mod search;
pub mod search_general;
pub mod search_logistics;

pub use calendar_ics::CalendarTool;
pub use search::{PageExtract, SearchBackend, SearchHit, SearchOutcome, SearchRequest, StaticSearchBackend};
pub use search_general::SearchGeneralTool;
pub use search_logistics::SearchLogisticsTool;

use std::sync::Arc;
use std::time::Duration;
use wayfarer_config::AppConfig;
use wayfarer_core::error::ToolError;
use wayfarer_core::message::UserId;
use wayfarer_core::tool::ToolRegistry;

/// Build the registry a user's session dispatches through.
pub fn registry_for_user(
    config: &AppConfig,
    backend: Arc<dyn SearchBackend>,
    user: &UserId,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new(Duration::from_secs(config.agent.tool_timeout_secs));
    registry.register(Box::new(SearchLogisticsTool::new(
        backend.clone(),
        config.search.max_results,
    )))?;
    registry.register(Box::new(SearchGeneralTool::new(
        backend.clone(),
        config.search.max_results,
    )))?;
    registry.register(Box::new(CalendarTool::new(
        config.paths.calendar_dir.clone(),
        user.clone(),
    )))?;
    Ok(registry)
}
