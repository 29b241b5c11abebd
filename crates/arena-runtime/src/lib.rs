//! # Arena Runtime
//!
//! Competition orchestration for the Arena evaluation harness.
//!
//! - [`Competition`] — round-robin fan-out, multi-judge scoring, stable ranking
//! - [`operations`] — name-based `invoke` / `compete` / `list_models` over a
//!   [`ProviderRegistry`](arena_llm::ProviderRegistry)
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use arena_adversarial::{HeuristicJudge, RubricSpec};
//! use arena_core::Conversation;
//! use arena_llm::MockProvider;
//! use arena_runtime::{Competition, CompetitionSpec, ProviderTarget};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = CompetitionSpec::round_robin(
//!     vec![
//!         ProviderTarget::new(Arc::new(MockProvider::constant("short")), "a"),
//!         ProviderTarget::new(Arc::new(MockProvider::named("verbose")), "b"),
//!     ],
//!     vec![Arc::new(HeuristicJudge::new())],
//!     RubricSpec::new().weight("length", 1.0),
//! );
//!
//! let result = Competition::new()
//!     .compete(&Conversation::from_prompt("demo", "Explain ownership in Rust"), &spec)
//!     .await?;
//! assert_eq!(result.leaderboard.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod competition;
pub mod operations;

pub use competition::{
    aggregate, rank, CandidateTrace, Competition, CompetitionError, CompetitionMode,
    CompetitionResult, CompetitionSpec, JudgeScore, ProviderTarget, RankedCandidate,
};
pub use operations::{
    compete_operation, invoke, list_models, CompeteRequest, CompeteSpec, CompeteSummary,
    InvokeRequest, InvokeResult, JudgeSpec, LeaderboardEntry, ProviderChoice, WinnerSummary,
};
