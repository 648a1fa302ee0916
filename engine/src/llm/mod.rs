//! LLM Provider Abstraction Layer
//!
//! This module is the call boundary to the text-generation service. Every
//! pipeline stage talks to the model through the `LLMProvider` trait: prompt
//! messages in, raw text out. Providers may fail on transport or quota; those
//! failures surface as `LLMError` and convert into `QuillError::Transport`.
//!
//! Retries, timeouts and cancellation belong to the provider. The pipeline
//! itself never retries.

use async_trait::async_trait;
use quill_sdk::errors::QuillError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::LLMConfig;

pub mod ollama;
pub mod openai;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for QuillError {
    fn from(err: LLMError) -> Self {
        QuillError::Transport(err.to_string())
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "ollama", "openai")
    fn name(&self) -> &str;

    /// Send the conversation and return the model's raw reply text
    ///
    /// The reply is free-form: it may wrap JSON in prose or code fences.
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Build the provider selected in configuration
pub fn build_provider(config: &LLMConfig) -> std::result::Result<Arc<dyn LLMProvider>, QuillError> {
    let timeout = std::time::Duration::from_secs(config.request_timeout_secs);
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(ollama::OllamaProvider::with_timeout(
            &config.ollama.base_url,
            &config.ollama.model,
            timeout,
        )?)),
        "openai" => Ok(Arc::new(openai::OpenAIProvider::from_config(
            config.openai.clone(),
            timeout,
        )?)),
        other => Err(QuillError::Config(format!("Unknown LLM provider '{}'", other))),
    }
}
