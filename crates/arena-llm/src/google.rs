//! Google Gemini `generateContent` provider

use async_trait::async_trait;
use arena_core::{Conversation, Role, TokenUsage};
use serde::{Deserialize, Serialize};

use crate::provider::{ChatProvider, ChatRequest, ChatResponse, LlmError, ModelLimits};

const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeneratedCandidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeneratedCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

/// Google Gemini provider
#[derive(Debug)]
pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    models: Vec<String>,
    limits: ModelLimits,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            models: ["gemini-1.5-pro", "gemini-1.5-flash", "gemini-pro"]
                .map(String::from)
                .to_vec(),
            limits: ModelLimits::new(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_models(mut self, models: Vec<String>) -> Self {
        if !models.is_empty() {
            self.models = models;
        }
        self
    }

    pub fn with_model_limits(mut self, limits: ModelLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Gemini takes turns as `user`/`model` and the system prompt separately.
    ///
    /// An explicit system prompt wins over system messages in the conversation.
    fn split_system(
        conversation: &Conversation,
        system: Option<&str>,
    ) -> (Option<Content>, Vec<Content>) {
        let inline_system = conversation
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let system = system
            .map(str::to_string)
            .or_else(|| (!inline_system.is_empty()).then_some(inline_system))
            .map(|text| Content::text(None, &text));

        let contents = conversation
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                let role = if m.role == Role::User { "user" } else { "model" };
                Content::text(Some(role), &m.content)
            })
            .collect();

        (system, contents)
    }

    fn reply_text(response: &GenerateResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        Ok(self.models.clone())
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let (system_instruction, contents) =
            Self::split_system(&request.conversation, request.system.as_deref());

        let body = GenerateRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_output_tokens: request.max_tokens_or(&self.limits),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, request.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
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

        let api_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = Self::reply_text(&api_response);
        let usage = api_response
            .usage_metadata
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count));
        Ok(ChatResponse::from_reply(&request, text, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_mapped_and_system_lifted() {
        let conv = Conversation::new("s")
            .append(Role::System, "be terse", None)
            .append(Role::User, "question", None)
            .append(Role::Assistant, "answer", None)
            .append(Role::Tool, "lookup", None);

        let (system, contents) = GoogleProvider::split_system(&conv, None);
        assert_eq!(system, Some(Content::text(None, "be terse")));
        let roles: Vec<_> = contents.iter().filter_map(|c| c.role.as_deref()).collect();
        assert_eq!(roles, vec!["user", "model", "model"]);
    }

    #[test]
    fn test_request_wire_shape() {
        let body = GenerateRequest {
            contents: vec![Content::text(Some("user"), "hi")],
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: Some(64),
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 64);
        assert!(value.get("systemInstruction").is_none());
    }

    #[test]
    fn test_reply_parts_joined() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}],"usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":2,"totalTokenCount":6}}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(GoogleProvider::reply_text(&parsed), "Hello");
        let usage = parsed.usage_metadata.unwrap();
        assert_eq!(
            TokenUsage::new(usage.prompt_token_count, usage.candidates_token_count).total,
            6
        );
    }

    #[test]
    fn test_no_candidates_is_empty_text() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(GoogleProvider::reply_text(&parsed), "");
    }
}
