//! # Arena LLM
//!
//! Provider capabilities consumed by judges, competitions and debates.
//!
//! ## Supported Backends
//!
//! | Provider | Type | Key Required |
//! |----------|------|--------------|
//! | OpenAI | API | `OPENAI_API_KEY` |
//! | Anthropic | API | `ANTHROPIC_API_KEY` |
//! | Google (Gemini) | API | `GOOGLE_API_KEY` |
//! | xAI | API | `XAI_API_KEY` |
//! | DeepSeek | API | `DEEPSEEK_API_KEY` |
//! | Local (OpenAI-compatible) | Gateway | None |
//! | Mock | Testing | None |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use arena_llm::{ChatProvider, MockProvider, ProviderRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ProviderRegistry::new()
//!         .with(Arc::new(MockProvider::constant("Hello from the mock")));
//!
//!     let (provider, model) = registry.resolve("mock/mock-model-1").await.unwrap();
//!     let reply = provider.ask(&model, "Say hello").await.unwrap();
//!     assert_eq!(reply, "Hello from the mock");
//! }
//! ```

pub mod anthropic;
pub mod config;
pub mod google;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod registry;
pub mod summarizer;

pub use anthropic::AnthropicProvider;
pub use config::{ArenaConfig, ConfigError, ModelSpec, ProviderConfig, DEFAULT_CONFIG_PATH};
pub use google::GoogleProvider;
pub use mock::MockProvider;
pub use openai::OpenAICompatibleProvider;
pub use provider::{ChatProvider, ChatRequest, ChatResponse, LlmError, ModelLimits};
pub use registry::{split_target, ProviderRegistry};
pub use summarizer::ProviderSummarizer;
