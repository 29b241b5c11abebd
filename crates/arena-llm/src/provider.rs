//! Provider capability trait and common types

use std::collections::BTreeMap;

use async_trait::async_trait;
use arena_core::{Conversation, TokenUsage};
use thiserror::Error;

/// Errors from providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Provider not available")]
    NotAvailable,
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("Provider {0} is not configured")]
    NotConfigured(String),
    #[error("Provider {0} has no models")]
    NoModel(String),
}

/// Model id -> configured output token cap
pub type ModelLimits = BTreeMap<String, u32>;

/// A chat call against one model
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation the model continues
    pub conversation: Conversation,
    /// Model identifier understood by the provider
    pub model: String,
    /// Optional system prompt sent ahead of the conversation
    pub system: Option<String>,
    /// Sampling temperature; provider default when absent
    pub temperature: Option<f32>,
    /// Output token cap; provider default when absent
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(conversation: Conversation, model: &str) -> Self {
        Self {
            conversation,
            model: model.to_string(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// The explicit cap, else the configured cap for this model
    pub fn max_tokens_or(&self, limits: &ModelLimits) -> Option<u32> {
        self.max_tokens.or_else(|| limits.get(&self.model).copied())
    }
}

/// Result of a chat call
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Input conversation with the assistant reply appended
    pub conversation: Conversation,
    /// The generated text
    pub output_text: String,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
}

impl ChatResponse {
    /// Build a response by appending `output_text` as an assistant message
    pub fn from_reply(request: &ChatRequest, output_text: String, usage: Option<TokenUsage>) -> Self {
        let conversation =
            request
                .conversation
                .append(arena_core::Role::Assistant, &output_text, None);
        Self {
            conversation,
            output_text,
            usage,
        }
    }
}

/// A named text-generation capability
#[async_trait]
pub trait ChatProvider: Send + Sync + std::fmt::Debug {
    /// Provider name used for registry lookup and candidate ids
    fn name(&self) -> &str;

    /// Model identifiers this provider serves
    async fn list_models(&self) -> Result<Vec<String>, LlmError>;

    /// Continue a conversation with the target model
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// One-shot prompt against a model (convenience method)
    async fn ask(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let conversation = Conversation::generated("ask").append(arena_core::Role::User, prompt, None);
        let response = self.chat(ChatRequest::new(conversation, model)).await?;
        Ok(response.output_text)
    }
}
