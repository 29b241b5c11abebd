//! Two-party debate protocol
//!
//! Each round runs respond → critique → refine between provider A and
//! provider B, strictly in sequence. After the last round an optional judge
//! scores A's final refined answer against B's final critique.

use std::fmt;
use std::sync::Arc;

use arena_core::{noop_sink, Conversation, Role, SharedSink, TraceEvent, TraceEventType};
use arena_llm::{ChatProvider, ChatRequest, LlmError, ProviderRegistry};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::judge::{DebateJudge, JudgeError, Verdict};

/// Debate errors
#[derive(Debug, Error)]
pub enum DebateError {
    #[error("Debate configuration error: {0}")]
    Configuration(String),
    #[error("Debate provider error: {0}")]
    Provider(#[from] LlmError),
    #[error("Debate judge error: {0}")]
    Judge(#[from] JudgeError),
}

/// What to debate and between whom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateConfig {
    /// `provider` or `provider/model`
    pub provider_a: String,
    pub provider_b: String,
    pub prompt: String,
    pub rounds: u32,
}

impl DebateConfig {
    pub fn new(provider_a: &str, provider_b: &str, prompt: &str, rounds: u32) -> Self {
        Self {
            provider_a: provider_a.to_string(),
            provider_b: provider_b.to_string(),
            prompt: prompt.to_string(),
            rounds,
        }
    }
}

/// One respond → critique → refine cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
    /// Starts at 1
    pub turn: u32,
    #[serde(rename = "providerA_response")]
    pub provider_a_response: String,
    #[serde(rename = "providerB_critique")]
    pub provider_b_critique: String,
    #[serde(rename = "providerA_refined")]
    pub provider_a_refined: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    /// Strictly greater wins; anything else is a tie
    pub fn decide(a: f64, b: f64) -> Self {
        if a > b {
            Self::A
        } else if b > a {
            Self::B
        } else {
            Self::Tie
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Tie => "tie",
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebateScores {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "B")]
    pub b: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateVerdicts {
    #[serde(rename = "A")]
    pub a: Verdict,
    #[serde(rename = "B")]
    pub b: Verdict,
}

/// Full record of a debate; winner and scores are set once at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateState {
    pub prompt: String,
    pub rounds: Vec<DebateRound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<DebateScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdicts: Option<DebateVerdicts>,
}

impl DebateState {
    pub fn is_concluded(&self) -> bool {
        self.winner.is_some()
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    fn conclude(&mut self, a: Verdict, b: Verdict) {
        let winner = Winner::decide(a.score, b.score);
        self.scores = Some(DebateScores {
            a: a.score,
            b: b.score,
        });
        self.winner = Some(winner);
        self.verdicts = Some(DebateVerdicts { a, b });
    }
}

/// Drives debates between two registered providers
pub struct DebateCoordinator {
    registry: Option<ProviderRegistry>,
    judge: Option<Arc<dyn DebateJudge>>,
    trace: SharedSink,
}

impl Default for DebateCoordinator {
    fn default() -> Self {
        Self {
            registry: None,
            judge: None,
            trace: noop_sink(),
        }
    }
}

impl DebateCoordinator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self::default().with_registry(registry)
    }

    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_judge(mut self, judge: Arc<dyn DebateJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_trace_sink(mut self, sink: SharedSink) -> Self {
        self.trace = sink;
        self
    }

    /// Empty state for a debate that has not started
    pub fn initialize_debate(&self, config: &DebateConfig) -> DebateState {
        DebateState {
            prompt: config.prompt.clone(),
            rounds: Vec::new(),
            winner: None,
            scores: None,
            verdicts: None,
        }
    }

    /// Run all rounds, then judge if a judge is configured.
    ///
    /// Judge errors are returned to the caller, not absorbed.
    pub async fn run_debate(&self, config: &DebateConfig) -> Result<DebateState, DebateError> {
        let registry = self.registry.as_ref().ok_or_else(|| {
            DebateError::Configuration("no provider registry configured".to_string())
        })?;
        if config.rounds == 0 {
            return Err(DebateError::Configuration(
                "rounds must be at least 1".to_string(),
            ));
        }

        let (provider_a, model_a) = registry.resolve(&config.provider_a).await?;
        let (provider_b, model_b) = registry.resolve(&config.provider_b).await?;

        let session_id = format!("debate-{}", Uuid::new_v4());
        tracing::info!(
            session = %session_id,
            provider_a = %config.provider_a,
            provider_b = %config.provider_b,
            rounds = config.rounds,
            "Starting debate"
        );
        metrics::counter!("arena_debates_total").increment(1);
        self.emit(
            &session_id,
            TraceEventType::CompetitionStart,
            json!({
                "mode": "debate",
                "providerA": config.provider_a,
                "providerB": config.provider_b,
                "rounds": config.rounds,
            }),
        );

        let mut state = self.initialize_debate(config);
        let mut conv_a = Conversation::from_prompt(session_id.clone(), &config.prompt);
        let mut conv_b = Conversation::new(session_id.clone());

        for turn in 1..=config.rounds {
            self.emit(
                &session_id,
                TraceEventType::DebateTurn,
                json!({ "turn": turn, "phase": "start" }),
            );

            if turn > 1 {
                conv_a = conv_a.append(Role::User, &restate_prompt(&config.prompt), None);
            }
            let response = call(provider_a.as_ref(), &model_a, conv_a).await?;
            conv_a = response.0;
            let a_response = response.1;

            conv_b = conv_b.append(
                Role::User,
                &critique_prompt(&config.prompt, &a_response),
                None,
            );
            let critique = call(provider_b.as_ref(), &model_b, conv_b).await?;
            conv_b = critique.0;
            let b_critique = critique.1;

            conv_a = conv_a.append(Role::User, &refine_prompt(&b_critique), None);
            let refined = call(provider_a.as_ref(), &model_a, conv_a).await?;
            conv_a = refined.0;

            state.rounds.push(DebateRound {
                turn,
                provider_a_response: a_response,
                provider_b_critique: b_critique,
                provider_a_refined: refined.1,
            });
            metrics::counter!("arena_debate_rounds_total").increment(1);
            self.emit(
                &session_id,
                TraceEventType::DebateTurn,
                json!({ "turn": turn, "phase": "complete" }),
            );
        }

        if let (Some(judge), Some(last)) = (&self.judge, state.rounds.last()) {
            let a = judge.score(&config.prompt, &last.provider_a_refined).await?;
            let b = judge.score(&config.prompt, &last.provider_b_critique).await?;
            state.conclude(a, b);
        }

        tracing::info!(
            session = %session_id,
            winner = state.winner.map(|w| w.as_str()).unwrap_or("none"),
            "Debate finished"
        );
        self.emit(
            &session_id,
            TraceEventType::CompetitionEnd,
            json!({ "winner": state.winner, "scores": state.scores }),
        );

        Ok(state)
    }

    fn emit(&self, session_id: &str, event_type: TraceEventType, data: serde_json::Value) {
        self.trace.emit(TraceEvent::new(session_id, event_type, data));
    }
}

async fn call(
    provider: &dyn ChatProvider,
    model: &str,
    conversation: Conversation,
) -> Result<(Conversation, String), LlmError> {
    let response = provider.chat(ChatRequest::new(conversation, model)).await?;
    tracing::debug!(provider = %provider.name(), model = %model, "Debate step complete");
    Ok((response.conversation, response.output_text))
}

fn critique_prompt(prompt: &str, answer: &str) -> String {
    format!(
        "Question: {}\n\n\
         Another assistant answered:\n\"\"\"\n{}\n\"\"\"\n\n\
         Critique this answer: point out errors, gaps and weak reasoning. \
         Then give your counter-proposal, a better answer of your own.",
        prompt, answer
    )
}

fn refine_prompt(critique: &str) -> String {
    format!(
        "Another assistant reviewed your answer and replied:\n\"\"\"\n{}\n\"\"\"\n\n\
         Refine your answer, taking the valid points into account.",
        critique
    )
}

fn restate_prompt(prompt: &str) -> String {
    format!(
        "Considering the discussion so far, give your best current answer to: {}",
        prompt
    )
}
