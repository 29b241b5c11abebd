//! OpenAI-compatible chat provider
//!
//! Serves OpenAI itself plus every backend speaking the same wire format
//! (xAI, DeepSeek, LiteLLM/Ollama style local gateways).

use async_trait::async_trait;
use arena_core::{Conversation, Role, TokenUsage};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::provider::{ChatProvider, ChatRequest, ChatResponse, LlmError, ModelLimits};

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// OpenAI API request format
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
struct WireMessage {
    role: &'static str,
    content: String,
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Provider for any OpenAI-compatible `/v1/chat/completions` endpoint
#[derive(Debug)]
pub struct OpenAICompatibleProvider {
    /// Registry name (e.g., "openai", "xai", "local")
    name: String,
    /// API key; local gateways may not need one
    api_key: Option<String>,
    /// Base URL without the `/v1` suffix
    base_url: String,
    /// Models advertised by `list_models`
    models: Vec<String>,
    /// Configured `max_tokens` per model
    limits: ModelLimits,
    /// HTTP client
    client: reqwest::Client,
}

impl OpenAICompatibleProvider {
    /// Create a provider with an explicit base URL
    pub fn new(name: &str, api_key: Option<String>, base_url: &str, models: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            models,
            limits: ModelLimits::new(),
            client: reqwest::Client::new(),
        }
    }

    /// OpenAI
    pub fn openai(api_key: &str) -> Self {
        Self::new(
            "openai",
            Some(api_key.to_string()),
            "https://api.openai.com",
            ["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"]
                .map(String::from)
                .to_vec(),
        )
    }

    /// xAI (Grok)
    pub fn xai(api_key: &str) -> Self {
        Self::new(
            "xai",
            Some(api_key.to_string()),
            "https://api.x.ai",
            ["grok-2-latest", "grok-beta"].map(String::from).to_vec(),
        )
    }

    /// DeepSeek
    pub fn deepseek(api_key: &str) -> Self {
        Self::new(
            "deepseek",
            Some(api_key.to_string()),
            "https://api.deepseek.com",
            ["deepseek-chat", "deepseek-coder"].map(String::from).to_vec(),
        )
    }

    /// Local OpenAI-compatible gateway (default: http://127.0.0.1:4000)
    pub fn local(endpoint: Option<&str>) -> Self {
        Self::new(
            "local",
            None,
            endpoint.unwrap_or("http://127.0.0.1:4000"),
            vec!["local".to_string()],
        )
    }

    /// Override the advertised models
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        if !models.is_empty() {
            self.models = models;
        }
        self
    }

    /// Cap output tokens per model when a request sets no cap
    pub fn with_model_limits(mut self, limits: ModelLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn wire_messages(conversation: &Conversation, system: Option<&str>) -> Vec<WireMessage> {
        let mut messages: Vec<WireMessage> = conversation
            .messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::Tool => "assistant",
                    other => other.as_str(),
                },
                content: m.content.clone(),
            })
            .collect();

        if let Some(system) = system {
            messages.insert(
                0,
                WireMessage {
                    role: "system",
                    content: system.to_string(),
                },
            );
        }
        messages
    }
}

#[async_trait]
impl ChatProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        Ok(self.models.clone())
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let start = Instant::now();
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = OpenAIRequest {
            model: request.model.clone(),
            messages: Self::wire_messages(&request.conversation, request.system.as_deref()),
            temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: request.max_tokens_or(&self.limits),
        };

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!(
                "Status: {}, Body: {}",
                status, body
            )));
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = api_response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        tracing::debug!(
            provider = %self.name,
            model = %request.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "Chat completed"
        );

        let usage = api_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));
        Ok(ChatResponse::from_reply(&request, content, usage))
    }
}
