//! # Arena Adversarial
//!
//! Scoring and two-party debate for the Arena evaluation harness.
//!
//! ## Key Types
//!
//! - [`Judge`] — scores a [`Candidate`] against a [`RubricSpec`]
//! - [`HeuristicJudge`] — deterministic length / keyword / structure scoring
//! - [`LlmJudge`] — asks a model to grade, falls back to a neutral score on failure
//! - [`DebateCoordinator`] — respond → critique → refine rounds, then a verdict
//!
//! ## Quick Start
//!
//! ```rust
//! use arena_adversarial::{HeuristicJudge, RubricSpec};
//!
//! let rubric = RubricSpec::new()
//!     .weight("keywords", 1.0)
//!     .with_keywords(["install", "usage", "documentation"]);
//!
//! let score = HeuristicJudge::evaluate("Install it, then check usage.", &rubric);
//! assert!((score.breakdown["keywords"] - 2.0 / 3.0).abs() < 1e-9);
//! ```
//!
//! ## Debates
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use arena_adversarial::{DebateConfig, DebateCoordinator, HeuristicJudge, RubricDebateJudge, RubricSpec};
//! use arena_llm::{MockProvider, ProviderRegistry};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ProviderRegistry::new()
//!     .with(Arc::new(MockProvider::named("openai")))
//!     .with(Arc::new(MockProvider::named("google")));
//!
//! let judge = RubricDebateJudge::new(HeuristicJudge, RubricSpec::new().weight("length", 1.0));
//! let coordinator = DebateCoordinator::new(registry).with_judge(Arc::new(judge));
//!
//! let state = coordinator
//!     .run_debate(&DebateConfig::new("openai/gpt-4o-mini", "google/gemini-2.5-flash", "What is 2+2?", 1))
//!     .await?;
//! println!("winner: {:?}", state.winner);
//! # Ok(())
//! # }
//! ```

pub mod debate;
pub mod heuristic;
pub mod judge;
pub mod llm_judge;

pub use debate::{
    DebateConfig, DebateCoordinator, DebateError, DebateRound, DebateScores, DebateState,
    DebateVerdicts, Winner,
};
pub use heuristic::HeuristicJudge;
pub use judge::{
    Candidate, DebateJudge, Judge, JudgeError, RubricDebateJudge, RubricSpec, Score, Verdict,
};
pub use llm_judge::{LlmJudge, FALLBACK_REASONING};
