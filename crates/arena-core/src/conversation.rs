//! Canonical conversation documents
//!
//! A [`Conversation`] is the unit of exchange between providers, judges and
//! the orchestration layer. Every transformation returns a new value, so a
//! snapshot handed to one component is never changed underneath another.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form metadata attached to messages, attachments and artifacts
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Replacement text for redacted secrets
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Speaker of a message. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    /// All accepted roles, in schema order
    pub const ALL: [Role; 4] = [Role::User, Role::Assistant, Role::System, Role::Tool];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Kind of a message attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    File,
    Image,
    Audio,
    Video,
    Url,
}

/// A file or link attached to a single message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Kind of a session-level artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Doc,
    Code,
    Image,
    Audio,
    Video,
    Archive,
    Other,
}

/// A document produced or referenced during the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub kind: ArtifactKind,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

/// Token accounting for one provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl TokenUsage {
    /// Build a usage record; `total` is always `prompt + completion`
    pub fn new(prompt: u32, completion: u32) -> Self {
        Self {
            prompt,
            completion,
            total: prompt.saturating_add(completion),
        }
    }
}

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// RFC 3339 timestamp, stamped when the message is appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Message {
    /// Create a bare message with no timestamp or metadata
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            name: None,
            timestamp: None,
            attachments: None,
            citations: None,
            meta: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// Canonical normalized conversation (CNF)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Assigned at creation, never changed by any transformation
    pub session_id: String,
    /// Dialogue order
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Conversation {
    /// Create an empty conversation for the given session
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            artifacts: None,
            scratch: None,
            tags: None,
            locale: None,
            timezone: None,
        }
    }

    /// Create an empty conversation with a fresh `<prefix>-<uuid>` session id
    pub fn generated(prefix: &str) -> Self {
        Self::new(format!("{}-{}", prefix, Uuid::new_v4()))
    }

    /// Create a conversation holding a single user message
    pub fn from_prompt(session_id: impl Into<String>, prompt: &str) -> Self {
        Self::new(session_id).append(Role::User, prompt, None)
    }

    /// Return a copy with a new message appended, stamped with the current time
    pub fn append(&self, role: Role, content: &str, meta: Option<Meta>) -> Self {
        let mut message = Message::new(role, content);
        message.timestamp = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        message.meta = meta;
        self.append_message(message)
    }

    /// Return a copy with the given message appended verbatim
    pub fn append_message(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        next
    }

    /// Content of the most recent message, or `""` for an empty conversation
    pub fn last_message_content(&self) -> &str {
        self.messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Return a copy with provider API-key shaped tokens replaced by [`REDACTION_MARKER`]
    pub fn redact_secrets(&self) -> Self {
        let mut next = self.clone();
        for message in &mut next.messages {
            message.content = redact_text(&message.content);
        }
        next
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn secret_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // OpenAI, including Anthropic's sk-ant- prefix
            r"sk-[A-Za-z0-9_-]+",
            // Google
            r"AIza[A-Za-z0-9_-]{35}",
            // xAI
            r"xai-[A-Za-z0-9]{32,}",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("secret pattern is a valid regex"))
        .collect()
    })
}

/// Replace every secret-shaped token in `text`, leaving other text untouched
pub fn redact_text(text: &str) -> String {
    secret_patterns()
        .iter()
        .fold(text.to_string(), |acc, re| {
            re.replace_all(&acc, REDACTION_MARKER).into_owned()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_does_not_mutate_original() {
        let original = Conversation::new("s1");
        let next = original.append(Role::User, "hello", None);

        assert!(original.is_empty());
        assert_eq!(next.len(), 1);
        assert_eq!(next.session_id, "s1");
        assert_eq!(next.messages[0].role, Role::User);
        assert!(next.messages[0].timestamp.is_some());
    }

    #[test]
    fn test_append_keeps_meta() {
        let mut meta = Meta::new();
        meta.insert("source".to_string(), serde_json::json!("test"));
        let conv = Conversation::new("s1").append(Role::Assistant, "hi", Some(meta.clone()));
        assert_eq!(conv.messages[0].meta, Some(meta));
    }

    #[test]
    fn test_last_message_content() {
        assert_eq!(Conversation::new("empty").last_message_content(), "");

        let conv = Conversation::from_prompt("s1", "first").append(Role::Assistant, "second", None);
        assert_eq!(conv.last_message_content(), "second");
    }

    #[test]
    fn test_redact_openai_key() {
        let conv = Conversation::from_prompt("s1", "my key is sk-abc123_XYZ-789 please keep it");
        let redacted = conv.redact_secrets();

        assert_eq!(
            redacted.messages[0].content,
            "my key is [REDACTED] please keep it"
        );
        assert!(conv.messages[0].content.contains("sk-abc123"));
    }

    #[test]
    fn test_redact_google_and_xai_keys() {
        let google = format!("AIza{}", "a".repeat(35));
        let xai = format!("xai-{}", "B".repeat(40));
        let text = format!("g={} x={}", google, xai);

        assert_eq!(redact_text(&text), "g=[REDACTED] x=[REDACTED]");
    }

    #[test]
    fn test_redact_leaves_plain_text() {
        let text = "nothing secret here, just a task list";
        assert_eq!(redact_text(text), text);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("tool".parse::<Role>(), Ok(Role::Tool));
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::new(12, 30);
        assert_eq!(usage.total, 42);
    }

    #[test]
    fn test_camel_case_wire_shape() {
        let conv = Conversation::from_prompt("abc", "hi");
        let value = serde_json::to_value(&conv).unwrap();
        assert_eq!(value["sessionId"], "abc");
        assert!(value.get("artifacts").is_none());
    }
}
