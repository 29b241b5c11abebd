//! # Arena Core
//!
//! Shared types for the Arena evaluation harness:
//! - [`Conversation`] — canonical normalized conversation (CNF) with immutable updates
//! - [`validate`] — field-level validation of untrusted conversation payloads
//! - [`compress`] — fold old messages into a summary, keep a recent window
//! - [`TraceEvent`] / [`TraceSink`] — fire-and-forget lifecycle tracing
//!
//! ## Quick Start
//!
//! ```rust
//! use arena_core::{Conversation, Role};
//!
//! let conv = Conversation::new("session-1")
//!     .append(Role::User, "My key is sk-live-123, what is Rust?", None);
//!
//! let safe = conv.redact_secrets();
//! assert_eq!(safe.last_message_content(), "My key is [REDACTED], what is Rust?");
//! assert!(conv.last_message_content().contains("sk-live-123"));
//! ```

pub mod compression;
pub mod conversation;
pub mod schema;
pub mod trace;

pub use compression::{compress, CompressionConfig, CompressionError, Summarizer, SUMMARY_LABEL};
pub use conversation::{
    redact_text, Artifact, ArtifactKind, Attachment, AttachmentKind, Conversation, Message, Meta,
    Role, TokenUsage, REDACTION_MARKER,
};
pub use schema::{validate, ValidationResult};
pub use trace::{
    noop_sink, MemorySink, NoopSink, SharedSink, TraceEmitter, TraceEmitterConfig, TraceEvent,
    TraceEventType, TraceFormat, TraceLevel, TraceSink,
};
