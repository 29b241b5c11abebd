//! Conversation compression
//!
//! Long conversations keep their most recent window verbatim and fold the
//! rest into one synthetic `system` message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::{Conversation, Message};

/// Label prefixed to every synthetic summary message
pub const SUMMARY_LABEL: &str = "[Conversation summary]";

/// Errors from compression
#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("Summarization failed: {0}")]
    Summarization(String),
}

/// Compression settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionConfig {
    /// Number of most recent messages kept verbatim
    pub preserve_recent: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self { preserve_recent: 10 }
    }
}

/// Produces a summary of the messages being folded away
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, messages: &[Message]) -> Result<String, CompressionError>;
}

/// Compress `conversation` so that at most `preserve_recent` original messages remain.
///
/// Conversations at or under the window are returned unchanged. Without a
/// summarizer, a count-based placeholder is used as the summary.
pub async fn compress(
    conversation: &Conversation,
    config: &CompressionConfig,
    summarizer: Option<&dyn Summarizer>,
) -> Result<Conversation, CompressionError> {
    if conversation.messages.len() <= config.preserve_recent {
        return Ok(conversation.clone());
    }

    let split = conversation.messages.len() - config.preserve_recent;
    let (old, recent) = conversation.messages.split_at(split);

    let summary = match summarizer {
        Some(s) => s.summarize(old).await?,
        None => format!("[Conversation summary: {} messages]", old.len()),
    };

    tracing::debug!(
        session = %conversation.session_id,
        folded = old.len(),
        kept = recent.len(),
        "Compressed conversation"
    );

    let mut messages = Vec::with_capacity(recent.len() + 1);
    messages.push(Message::system(format!("{}: {}", SUMMARY_LABEL, summary)));
    messages.extend_from_slice(recent);

    let mut next = conversation.clone();
    next.messages = messages;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    fn conversation_of(n: usize) -> Conversation {
        (0..n).fold(Conversation::new("c1"), |conv, i| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            conv.append(role, &format!("message {}", i), None)
        })
    }

    struct FixedSummary;

    #[async_trait]
    impl Summarizer for FixedSummary {
        async fn summarize(&self, messages: &[Message]) -> Result<String, CompressionError> {
            Ok(format!("{} earlier turns about testing", messages.len()))
        }
    }

    struct BrokenSummary;

    #[async_trait]
    impl Summarizer for BrokenSummary {
        async fn summarize(&self, _messages: &[Message]) -> Result<String, CompressionError> {
            Err(CompressionError::Summarization("model offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_under_window_unchanged() {
        let conv = conversation_of(3);
        let config = CompressionConfig { preserve_recent: 3 };
        let out = compress(&conv, &config, None).await.unwrap();
        assert_eq!(out, conv);
    }

    #[tokio::test]
    async fn test_placeholder_summary() {
        let conv = conversation_of(6);
        let config = CompressionConfig { preserve_recent: 2 };
        let out = compress(&conv, &config, None).await.unwrap();

        assert_eq!(out.messages.len(), 3);
        assert_eq!(out.messages[0].role, Role::System);
        assert_eq!(
            out.messages[0].content,
            "[Conversation summary]: [Conversation summary: 4 messages]"
        );
        assert_eq!(out.messages[1..], conv.messages[4..]);
        assert_eq!(out.session_id, conv.session_id);
    }

    #[tokio::test]
    async fn test_custom_summarizer() {
        let conv = conversation_of(5);
        let config = CompressionConfig { preserve_recent: 1 };
        let out = compress(&conv, &config, Some(&FixedSummary)).await.unwrap();

        assert_eq!(
            out.messages[0].content,
            "[Conversation summary]: 4 earlier turns about testing"
        );
        assert_eq!(out.last_message_content(), "message 4");
    }

    #[tokio::test]
    async fn test_summarizer_failure_propagates() {
        let conv = conversation_of(5);
        let config = CompressionConfig { preserve_recent: 1 };
        let err = compress(&conv, &config, Some(&BrokenSummary)).await.unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }
}
