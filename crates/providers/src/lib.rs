//! Model provider implementations for Wayfarer.
//!
//! The OpenAI-compatible provider covers OpenAI, OpenRouter, Ollama, vLLM,
//! and any other endpoint exposing `/v1/chat/completions`. The scripted
//! provider exists for tests and offline demos.

pub mod openai_compat;
pub mod scripted;

pub use openai_compat::OpenAiCompatProvider;
pub use scripted::ScriptedProvider;
