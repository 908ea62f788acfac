//! Configuration loading and validation for Wayfarer.
//!
//! Loads configuration from a TOML file with environment variable overrides
//! for secrets and the most commonly tuned knobs. The resulting `AppConfig`
//! is immutable: it is constructed once at startup and passed by reference
//! into every component constructor. No ambient mutable state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model collaborator settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Orchestration loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Search tool settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Filesystem paths (calendar output, seed data)
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name sent to the provider
    #[serde(default = "default_model")]
    pub name: String,

    /// API base URL for the OpenAI-compatible endpoint
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key (usually supplied via WAYFARER_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "gpt-4.1".into()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_base: default_api_base(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("name", &self.name)
            .field("api_base", &self.api_base)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool-call rounds per turn before forced finalization
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Chat-history window size in messages
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,

    /// Maximum long-term memories retrieved per turn (K)
    #[serde(default = "default_recall_limit")]
    pub recall_limit: usize,

    /// Per-tool execution timeout in seconds
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Event channel capacity per session
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_max_tool_rounds() -> u32 {
    8
}
// Keep at least the last 20 conversation steps (≈ 40 messages)
fn default_max_history_messages() -> usize {
    40
}
fn default_recall_limit() -> usize {
    5
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_event_buffer() -> usize {
    256
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            max_history_messages: default_max_history_messages(),
            recall_limit: default_recall_limit(),
            tool_timeout_secs: default_tool_timeout_secs(),
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum results requested from the search backend
    #[serde(default = "default_max_search_results")]
    pub max_results: usize,
}

fn default_max_search_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_search_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for generated calendar files (one subdirectory per user)
    #[serde(default = "default_calendar_dir")]
    pub calendar_dir: PathBuf,

    /// Seed file mapping user ids to initial insights
    #[serde(default = "default_seed_file")]
    pub seed_file: PathBuf,
}

fn default_calendar_dir() -> PathBuf {
    PathBuf::from("assets/calendars")
}
fn default_seed_file() -> PathBuf {
    PathBuf::from("context/seed.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            calendar_dir: default_calendar_dir(),
            seed_file: default_seed_file(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            agent: AgentConfig::default(),
            search: SearchConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("model", &self.model)
            .field("agent", &self.agent)
            .field("search", &self.search)
            .field("paths", &self.paths)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment
    /// overrides. A missing file yields defaults (env overrides still
    /// apply).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&raw)?
        } else {
            debug!(path = %path.display(), "No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides for secrets and common knobs.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("WAYFARER_API_KEY") {
            if !key.is_empty() {
                self.model.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("WAYFARER_MODEL") {
            if !model.is_empty() {
                self.model.name = model;
            }
        }
        if let Ok(base) = std::env::var("WAYFARER_API_BASE") {
            if !base.is_empty() {
                self.model.api_base = base;
            }
        }
        if let Ok(rounds) = std::env::var("WAYFARER_MAX_TOOL_ROUNDS") {
            if let Ok(n) = rounds.parse() {
                self.agent.max_tool_rounds = n;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }
        if self.agent.max_history_messages == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_history_messages must be at least 1".into(),
            ));
        }
        if self.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "agent.tool_timeout_secs must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid(format!(
                "model.temperature must be within 0.0..=2.0, got {}",
                self.model.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.max_tool_rounds, 8);
        assert_eq!(config.agent.max_history_messages, 40);
        assert_eq!(config.agent.recall_limit, 5);
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/wayfarer.toml")).unwrap();
        assert_eq!(config.model.name, "gpt-4.1");
    }

    #[test]
    fn load_from_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wayfarer.toml");
        std::fs::write(
            &path,
            r#"
[model]
name = "gpt-4.1-mini"
temperature = 0.2

[agent]
max_tool_rounds = 3
max_history_messages = 10
"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.model.name, "gpt-4.1-mini");
        assert!((config.model.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.agent.max_tool_rounds, 3);
        assert_eq!(config.agent.max_history_messages, 10);
        // Untouched sections fall back to defaults
        assert_eq!(config.agent.recall_limit, 5);
    }

    #[test]
    fn invalid_tool_rounds_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("wayfarer.toml");
        std::fs::write(&path, "[agent]\nmax_tool_rounds = 0\n").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
