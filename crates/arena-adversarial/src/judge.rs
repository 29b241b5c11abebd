//! Judge contract and the data shapes judges work on

use std::collections::BTreeMap;

use arena_core::TokenUsage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a judge may raise
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Judge provider failed: {0}")]
    Provider(#[from] arena_llm::LlmError),
    #[error("Judge evaluation failed: {0}")]
    Evaluation(String),
}

/// One provider/model response, scoped to a single competition round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// `<provider>:<model>`
    pub id: String,
    pub text: String,
    pub provider_name: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// The prompt this candidate answers, when judges should see it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl Candidate {
    pub fn new(provider: &str, model: &str, text: impl Into<String>) -> Self {
        Self {
            id: format!("{}:{}", provider, model),
            text: text.into(),
            provider_name: provider.to_string(),
            model_name: model.to_string(),
            usage: None,
            question: None,
        }
    }

    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_question(mut self, question: &str) -> Self {
        self.question = (!question.is_empty()).then(|| question.to_string());
        self
    }
}

/// Weighted scoring criteria supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricSpec {
    /// Criterion name -> non-negative weight
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    /// Keywords for the `keywords` criterion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Judge name -> judge weight; unlisted judges get an equal share
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_weights: Option<BTreeMap<String, f64>>,
}

impl RubricSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set a criterion weight
    pub fn weight(mut self, criterion: &str, weight: f64) -> Self {
        self.weights.insert(criterion.to_string(), weight);
        self
    }

    pub fn with_keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn judge_weight(mut self, judge: &str, weight: f64) -> Self {
        self.judge_weights
            .get_or_insert_with(BTreeMap::new)
            .insert(judge.to_string(), weight);
        self
    }

    /// Weight of a criterion; absent criteria weigh 0
    pub fn weight_of(&self, criterion: &str) -> f64 {
        self.weights.get(criterion).copied().unwrap_or(0.0)
    }

    /// Judge weight if the rubric names one
    pub fn judge_weight_of(&self, judge: &str) -> Option<f64> {
        self.judge_weights.as_ref().and_then(|w| w.get(judge).copied())
    }
}

/// A judge's verdict on one candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Aggregate in [0, 1]
    pub total: f64,
    /// Criterion -> sub-score in [0, 1]
    #[serde(default)]
    pub breakdown: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// A scoring strategy mapping a candidate and rubric to a score
#[async_trait]
pub trait Judge: Send + Sync {
    /// Name used for rubric judge weights and trace maps
    fn name(&self) -> &str;

    async fn score(&self, candidate: &Candidate, rubric: &RubricSpec) -> Result<Score, JudgeError>;
}

/// Outcome of judging one side of a debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub score: f64,
    pub reasoning: String,
}

/// Scores a free-standing response to a prompt (used by debates)
#[async_trait]
pub trait DebateJudge: Send + Sync {
    async fn score(&self, prompt: &str, response: &str) -> Result<Verdict, JudgeError>;
}

/// Adapts any [`Judge`] plus a fixed rubric into a [`DebateJudge`]
pub struct RubricDebateJudge<J> {
    judge: J,
    rubric: RubricSpec,
}

impl<J: Judge> RubricDebateJudge<J> {
    pub fn new(judge: J, rubric: RubricSpec) -> Self {
        Self { judge, rubric }
    }
}

#[async_trait]
impl<J: Judge> DebateJudge for RubricDebateJudge<J> {
    async fn score(&self, prompt: &str, response: &str) -> Result<Verdict, JudgeError> {
        let candidate = Candidate::new("debate", self.judge.name(), response).with_question(prompt);
        let score = self.judge.score(&candidate, &self.rubric).await?;
        let reasoning = score.reasoning.unwrap_or_else(|| {
            score
                .breakdown
                .iter()
                .map(|(k, v)| format!("{}={:.2}", k, v))
                .collect::<Vec<_>>()
                .join(", ")
        });
        Ok(Verdict {
            score: score.total,
            reasoning,
        })
    }
}
