//! Provider-backed conversation summarizer

use std::sync::Arc;

use async_trait::async_trait;
use arena_core::{CompressionError, Conversation, Message, Role, Summarizer};

use crate::provider::{ChatProvider, ChatRequest};

/// Summarizes folded messages by asking a model
#[derive(Debug, Clone)]
pub struct ProviderSummarizer {
    provider: Arc<dyn ChatProvider>,
    model: String,
}

impl ProviderSummarizer {
    pub fn new(provider: Arc<dyn ChatProvider>, model: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
        }
    }

    fn transcript(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Summarizer for ProviderSummarizer {
    async fn summarize(&self, messages: &[Message]) -> Result<String, CompressionError> {
        let prompt = format!(
            "Summarize the following conversation in a few sentences. \
             Keep names, decisions and open questions.\n\n{}",
            Self::transcript(messages)
        );
        let conversation = Conversation::generated("summary").append(Role::User, &prompt, None);
        let request = ChatRequest::new(conversation, &self.model).with_temperature(0.2);

        self.provider
            .chat(request)
            .await
            .map(|r| r.output_text)
            .map_err(|e| CompressionError::Summarization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use arena_core::{compress, CompressionConfig};

    #[tokio::test]
    async fn test_summary_from_provider() {
        let mock = Arc::new(MockProvider::new(vec!["They agreed on Rust.".to_string()]));
        let summarizer = ProviderSummarizer::new(mock.clone(), "mock-model-1");

        let conv = Conversation::new("s")
            .append(Role::User, "Which language?", None)
            .append(Role::Assistant, "Rust.", None)
            .append(Role::User, "Great.", None);
        let out = compress(&conv, &CompressionConfig { preserve_recent: 1 }, Some(&summarizer))
            .await
            .unwrap();

        assert_eq!(out.messages[0].content, "[Conversation summary]: They agreed on Rust.");
        let prompt = mock.requests()[0].conversation.last_message_content().to_string();
        assert!(prompt.contains("user: Which language?"));
        assert!(prompt.contains("assistant: Rust."));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_compression_error() {
        let summarizer = ProviderSummarizer::new(Arc::new(MockProvider::failing("m", "down")), "x");
        let err = summarizer.summarize(&[Message::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("down"));
    }
}
