//! Chat assistant backed by an opaque text-completion service.
//!
//! The assistant never mutates the timeline. It answers scripted questions
//! locally and forwards everything else to a [`CompletionService`], by
//! default a local Ollama server.

use std::future::Future;

use thiserror::Error;

pub mod chat;
pub mod config;
pub mod ollama;

pub use chat::{quick_reply, AiFeature, Assistant, ChatMessage, EditingContext, Role};
pub use config::AssistantConfig;
pub use ollama::{parse_generate_response, OllamaClient};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssistantError {
    #[error("Could not connect to Ollama ({0}). Run 'ollama serve' in terminal.")]
    ServiceUnavailable(String),
    #[error("Invalid response from Ollama: {0}")]
    InvalidResponse(String),
    #[error("Ollama rejected the request: {0}")]
    Rejected(String),
}

impl AssistantError {
    /// Only an unreachable or failing server is worth asking again.
    pub fn is_retryable(&self) -> bool { matches!(self, Self::ServiceUnavailable(_)) }
}

pub type Result<T, E = AssistantError> = std::result::Result<T, E>;

/// Anything that turns a prompt into a completion.
pub trait CompletionService {
    fn send_prompt(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;

    fn check_connection(&self) -> impl Future<Output = bool> + Send {
        async { true }
    }
}
