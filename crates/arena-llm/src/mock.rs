//! Mock provider for testing

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use arena_core::TokenUsage;

use crate::provider::{ChatProvider, ChatRequest, ChatResponse, LlmError};

/// A mock provider that replays queued responses.
///
/// Once the queue is empty it falls back to a prompt-aware canned reply, so a
/// mock can drive competitions, debates and model judges without network access.
#[derive(Debug)]
pub struct MockProvider {
    name: String,
    models: Vec<String>,
    queue: Mutex<VecDeque<String>>,
    fallback: Option<String>,
    failure: Option<String>,
    latency: Duration,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Create a mock named `mock` with the given queued responses
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            name: "mock".to_string(),
            models: vec!["mock-model-1".to_string(), "mock-model-2".to_string()],
            queue: Mutex::new(responses.into()),
            fallback: None,
            failure: None,
            latency: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with no queued responses under a custom name
    pub fn named(name: &str) -> Self {
        Self::new(Vec::new()).with_name(name)
    }

    /// Create a mock whose every reply is `response`
    pub fn constant(response: &str) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.fallback = Some(response.to_string());
        mock
    }

    /// Create a mock whose every call fails with `message`
    pub fn failing(name: &str, message: &str) -> Self {
        let mut mock = Self::named(name);
        mock.failure = Some(message.to_string());
        mock
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_models(mut self, models: Vec<&str>) -> Self {
        self.models = models.into_iter().map(str::to_string).collect();
        self
    }

    /// Simulate network latency on every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue another response (FIFO)
    pub fn queue_response(&self, text: &str) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(text.to_string());
        }
    }

    /// Every request received so far, in call order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn canned_reply(request: &ChatRequest) -> String {
        let prompt = request.conversation.last_message_content().to_lowercase();

        if prompt.contains("judge") && prompt.contains("json") {
            return r#"{"total": 0.75, "breakdown": {}, "reasoning": "Mock evaluation"}"#
                .to_string();
        }

        if prompt.contains("critique") && prompt.contains("counter") {
            return "I disagree with parts of this answer:\n\
                 - It overlooks edge cases\n\
                 - It lacks concrete evidence\n\n\
                 Counter-proposal: start from the constraints and justify each step."
                .to_string();
        }

        if prompt.contains("refine") {
            return "## Refined answer\n\n\
                 Taking your critique into account, here is an improved response:\n\
                 - Edge cases are addressed explicitly\n\
                 - Each claim is backed by a **concrete** example"
                .to_string();
        }

        if prompt.contains("summarize") || prompt.contains("summary") {
            return "Summary: the key points are consolidated into a concise overview.".to_string();
        }

        let preview: String = request
            .conversation
            .last_message_content()
            .chars()
            .take(50)
            .collect();
        format!(
            "Here is my response to \"{}\":\n\
             - The request has been processed\n\
             - Analysis complete",
            preview
        )
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        Ok(self.models.clone())
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(message) = &self.failure {
            return Err(LlmError::RequestFailed(message.clone()));
        }

        let queued = self.queue.lock().ok().and_then(|mut q| q.pop_front());
        let text = queued
            .or_else(|| self.fallback.clone())
            .unwrap_or_else(|| Self::canned_reply(&request));

        Ok(ChatResponse::from_reply(
            &request,
            text,
            Some(TokenUsage::new(10, 20)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::{Conversation, Role};

    #[tokio::test]
    async fn test_queued_responses_in_order() {
        let mock = MockProvider::new(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(mock.ask("m", "a").await.unwrap(), "first");
        assert_eq!(mock.ask("m", "b").await.unwrap(), "second");
        assert!(mock.ask("m", "c").await.unwrap().contains("\"c\""));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_reply_appended_to_conversation() {
        let mock = MockProvider::constant("Hello, world!");
        let conv = Conversation::from_prompt("s1", "hi");
        let response = mock.chat(ChatRequest::new(conv.clone(), "m")).await.unwrap();

        assert_eq!(response.output_text, "Hello, world!");
        assert_eq!(response.conversation.len(), 2);
        assert_eq!(response.conversation.messages[1].role, Role::Assistant);
        assert_eq!(response.conversation.session_id, "s1");
        assert_eq!(conv.len(), 1);
        assert_eq!(response.usage, Some(TokenUsage { prompt: 10, completion: 20, total: 30 }));
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockProvider::failing("broken", "boom");
        let err = mock.ask("m", "hi").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_records_request_settings() {
        let mock = MockProvider::named("rec");
        let request = ChatRequest::new(Conversation::from_prompt("s", "x"), "m1")
            .with_temperature(0.3)
            .with_system(Some("be brief".to_string()));
        mock.chat(request).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen[0].model, "m1");
        assert_eq!(seen[0].temperature, Some(0.3));
        assert_eq!(seen[0].system.as_deref(), Some("be brief"));
    }
}
