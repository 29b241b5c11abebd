//! Competition orchestrator
//!
//! Fans a conversation out to every provider/model pair, scores the
//! survivors with every judge and ranks them by weighted judge score.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arena_adversarial::{Candidate, Judge, RubricSpec, Score};
use arena_core::{noop_sink, Conversation, SharedSink, TraceEvent, TraceEventType, TraceLevel};
use arena_llm::{ChatProvider, ChatRequest, LlmError};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Competition errors
#[derive(Debug, Error)]
pub enum CompetitionError {
    #[error("Unsupported competition mode: {0}")]
    UnsupportedMode(String),
    #[error("No providers specified")]
    NoProviders,
    #[error("All providers failed")]
    AllProvidersFailed,
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),
    #[error("Invalid judge: {0}")]
    InvalidJudge(String),
}

/// How candidates are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CompetitionMode {
    RoundRobin,
    /// Accepted on input, rejected by [`Competition::compete`]
    Cascade,
}

impl CompetitionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round-robin",
            Self::Cascade => "cascade",
        }
    }
}

impl fmt::Display for CompetitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompetitionMode {
    type Err = CompetitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "round-robin" => Ok(Self::RoundRobin),
            "cascade" => Ok(Self::Cascade),
            other => Err(CompetitionError::UnsupportedMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for CompetitionMode {
    type Error = CompetitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CompetitionMode> for String {
    fn from(mode: CompetitionMode) -> Self {
        mode.as_str().to_string()
    }
}

/// One provider/model pair taking part
#[derive(Debug, Clone)]
pub struct ProviderTarget {
    pub provider: Arc<dyn ChatProvider>,
    pub model: String,
}

impl ProviderTarget {
    pub fn new(provider: Arc<dyn ChatProvider>, model: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
        }
    }

    pub fn id(&self) -> String {
        format!("{}:{}", self.provider.name(), self.model)
    }
}

/// Everything a competition needs besides the seed conversation
#[derive(Clone)]
pub struct CompetitionSpec {
    /// Fan-out order; also the tie-break order
    pub providers: Vec<ProviderTarget>,
    pub mode: CompetitionMode,
    pub judges: Vec<Arc<dyn Judge>>,
    pub rubric: RubricSpec,
    pub system: Option<String>,
}

impl CompetitionSpec {
    pub fn round_robin(
        providers: Vec<ProviderTarget>,
        judges: Vec<Arc<dyn Judge>>,
        rubric: RubricSpec,
    ) -> Self {
        Self {
            providers,
            mode: CompetitionMode::RoundRobin,
            judges,
            rubric,
            system: None,
        }
    }

    pub fn with_system(mut self, system: Option<String>) -> Self {
        self.system = system;
        self
    }
}

/// A candidate with its aggregate score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: f64,
}

/// One judge's raw score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JudgeScore {
    pub judge: String,
    pub score: Score,
}

/// Every judge's raw score for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateTrace {
    pub candidate: Candidate,
    /// In judge order; failed judges are absent. Judges sharing a name each
    /// keep their own entry.
    pub scores: Vec<JudgeScore>,
}

impl CandidateTrace {
    /// First score recorded by a judge named `judge`
    pub fn score_of(&self, judge: &str) -> Option<&Score> {
        self.scores.iter().find(|s| s.judge == judge).map(|s| &s.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionResult {
    pub winner: RankedCandidate,
    /// Descending by score, ties in fan-out order
    pub leaderboard: Vec<RankedCandidate>,
    pub traces: Vec<CandidateTrace>,
}

impl CompetitionResult {
    pub fn trace_for(&self, candidate_id: &str) -> Option<&CandidateTrace> {
        self.traces.iter().find(|t| t.candidate.id == candidate_id)
    }
}

/// Weighted mean of judge totals.
///
/// A judge listed in the rubric's judge weights uses that weight, any other
/// judge gets `1 / judge_count`. No scores means 0.
pub fn aggregate(scores: &[JudgeScore], rubric: &RubricSpec, judge_count: usize) -> f64 {
    let default_weight = 1.0 / judge_count.max(1) as f64;
    let (sum, total_weight) = scores.iter().fold((0.0, 0.0), |(sum, w), entry| {
        let weight = rubric.judge_weight_of(&entry.judge).unwrap_or(default_weight);
        (sum + entry.score.total * weight, w + weight)
    });

    if total_weight > 0.0 {
        sum / total_weight
    } else {
        0.0
    }
}

/// Stable sort by descending score; equal scores keep their input order
pub fn rank(mut candidates: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    candidates
}

/// Runs competitions and reports lifecycle events to a trace sink
pub struct Competition {
    trace: SharedSink,
}

impl Default for Competition {
    fn default() -> Self {
        Self { trace: noop_sink() }
    }
}

impl Competition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trace_sink(mut self, sink: SharedSink) -> Self {
        self.trace = sink;
        self
    }

    /// Run a competition over `conversation`
    pub async fn compete(
        &self,
        conversation: &Conversation,
        spec: &CompetitionSpec,
    ) -> Result<CompetitionResult, CompetitionError> {
        match spec.mode {
            CompetitionMode::RoundRobin => self.round_robin(conversation, spec).await,
            other => Err(CompetitionError::UnsupportedMode(other.to_string())),
        }
    }

    async fn round_robin(
        &self,
        conversation: &Conversation,
        spec: &CompetitionSpec,
    ) -> Result<CompetitionResult, CompetitionError> {
        if spec.providers.is_empty() {
            return Err(CompetitionError::NoProviders);
        }

        let session = conversation.session_id.as_str();
        metrics::counter!("arena_competitions_total").increment(1);
        let provider_ids: Vec<String> = spec.providers.iter().map(ProviderTarget::id).collect();
        self.emit(TraceEvent::new(
            session,
            TraceEventType::CompetitionStart,
            json!({ "mode": CompetitionMode::RoundRobin.as_str(), "providers": provider_ids }),
        ));

        let candidates = self.collect_candidates(conversation, spec).await;
        if candidates.is_empty() {
            tracing::error!(session = %session, "All providers failed");
            return Err(CompetitionError::AllProvidersFailed);
        }

        let traces = join_all(
            candidates
                .into_iter()
                .map(|candidate| self.judge_candidate(session, candidate, spec)),
        )
        .await;

        let leaderboard = rank(
            traces
                .iter()
                .map(|t| RankedCandidate {
                    candidate: t.candidate.clone(),
                    score: aggregate(&t.scores, &spec.rubric, spec.judges.len()),
                })
                .collect(),
        );

        let winner = leaderboard
            .first()
            .cloned()
            .ok_or(CompetitionError::AllProvidersFailed)?;

        tracing::info!(
            session = %session,
            winner = %winner.candidate.id,
            score = winner.score,
            candidates = leaderboard.len(),
            "Competition finished"
        );
        self.emit(TraceEvent::new(
            session,
            TraceEventType::CompetitionEnd,
            json!({ "winner": winner.candidate.id, "score": winner.score }),
        ));

        Ok(CompetitionResult {
            winner,
            leaderboard,
            traces,
        })
    }

    /// Invoke every pair concurrently; failures are logged and dropped
    async fn collect_candidates(
        &self,
        conversation: &Conversation,
        spec: &CompetitionSpec,
    ) -> Vec<Candidate> {
        let session = conversation.session_id.as_str();
        let calls = spec.providers.iter().map(|target| async move {
            self.emit(TraceEvent::new(
                session,
                TraceEventType::ProviderInvoke,
                json!({ "provider": target.provider.name(), "model": target.model }),
            ));

            let request = ChatRequest::new(conversation.clone(), &target.model)
                .with_system(spec.system.clone());
            (target, target.provider.chat(request).await)
        });

        join_all(calls)
            .await
            .into_iter()
            .filter_map(|(target, outcome)| match outcome {
                Ok(response) => Some(
                    Candidate::new(target.provider.name(), &target.model, response.output_text)
                        .with_usage(response.usage)
                        .with_question(conversation.last_message_content()),
                ),
                Err(e) => {
                    tracing::warn!(
                        provider = %target.provider.name(),
                        model = %target.model,
                        error = %e,
                        "Provider failed, dropping candidate"
                    );
                    metrics::counter!("arena_provider_failures_total").increment(1);
                    self.emit(
                        TraceEvent::new(
                            session,
                            TraceEventType::ProviderError,
                            json!({
                                "provider": target.provider.name(),
                                "model": target.model,
                                "error": e.to_string(),
                            }),
                        )
                        .with_level(TraceLevel::Error),
                    );
                    None
                }
            })
            .collect()
    }

    /// Score one candidate with every judge; failed judges are omitted
    async fn judge_candidate(
        &self,
        session: &str,
        candidate: Candidate,
        spec: &CompetitionSpec,
    ) -> CandidateTrace {
        let target = &candidate;
        let rubric = &spec.rubric;
        let outcomes = join_all(
            spec.judges
                .iter()
                .map(|judge| async move { (judge.name(), judge.score(target, rubric).await) }),
        )
        .await;

        let mut scores = Vec::with_capacity(outcomes.len());
        for (name, outcome) in outcomes {
            match outcome {
                Ok(score) => {
                    self.emit(TraceEvent::new(
                        session,
                        TraceEventType::JudgeScore,
                        json!({ "candidate": candidate.id, "judge": name, "total": score.total }),
                    ));
                    scores.push(JudgeScore {
                        judge: name.to_string(),
                        score,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        judge = %name,
                        candidate = %candidate.id,
                        error = %e,
                        "Judge failed"
                    );
                    metrics::counter!("arena_judge_failures_total").increment(1);
                }
            }
        }

        CandidateTrace { candidate, scores }
    }

    fn emit(&self, event: TraceEvent) {
        self.trace.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(judge: &str, total: f64) -> JudgeScore {
        JudgeScore {
            judge: judge.to_string(),
            score: Score {
                total,
                ..Score::default()
            },
        }
    }

    fn ranked(id: &str, score: f64) -> RankedCandidate {
        RankedCandidate {
            candidate: Candidate::new(id, "m", "text"),
            score,
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(
            "round-robin".parse::<CompetitionMode>().unwrap(),
            CompetitionMode::RoundRobin
        );
        assert_eq!("cascade".parse::<CompetitionMode>().unwrap(), CompetitionMode::Cascade);
        let err = "tournament".parse::<CompetitionMode>().unwrap_err();
        assert!(matches!(err, CompetitionError::UnsupportedMode(ref m) if m == "tournament"));
        assert_eq!(err.to_string(), "Unsupported competition mode: tournament");
    }

    #[test]
    fn test_mode_wire_shape() {
        let mode: CompetitionMode = serde_json::from_str("\"round-robin\"").unwrap();
        assert_eq!(mode, CompetitionMode::RoundRobin);
        assert_eq!(serde_json::to_string(&CompetitionMode::Cascade).unwrap(), "\"cascade\"");
        assert!(serde_json::from_str::<CompetitionMode>("\"elimination\"").is_err());
    }

    #[test]
    fn test_aggregate_equal_weights() {
        let scores = vec![score("heuristic", 0.8), score("llm", 0.4)];
        assert!((aggregate(&scores, &RubricSpec::new(), 2) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_judge_weights() {
        let scores = vec![score("heuristic", 1.0), score("llm", 0.0)];
        let rubric = RubricSpec::new().judge_weight("heuristic", 3.0);
        // llm falls back to 1/2
        assert!((aggregate(&scores, &rubric, 2) - 3.0 / 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_missing_judge_excluded() {
        // two judges configured, one failed: the mean is over the survivor only
        let scores = vec![score("heuristic", 0.7)];
        assert!((aggregate(&scores, &RubricSpec::new(), 2) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_no_scores() {
        assert_eq!(aggregate(&[], &RubricSpec::new(), 0), 0.0);
        assert_eq!(aggregate(&[], &RubricSpec::new(), 3), 0.0);
    }

    #[test]
    fn test_aggregate_counts_same_named_judges() {
        let scores = vec![score("llm", 1.0), score("llm", 0.0)];
        assert!((aggregate(&scores, &RubricSpec::new(), 2) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_rank_is_stable() {
        let ordered = rank(vec![
            ranked("a", 0.5),
            ranked("b", 0.9),
            ranked("c", 0.5),
            ranked("d", 0.9),
        ]);
        let ids: Vec<&str> = ordered.iter().map(|r| r.candidate.provider_name.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_ranked_candidate_flattens() {
        let value = serde_json::to_value(ranked("openai", 0.5)).unwrap();
        assert_eq!(value["id"], "openai:m");
        assert_eq!(value["providerName"], "openai");
        assert_eq!(value["score"], 0.5);
    }

    #[tokio::test]
    async fn test_cascade_rejected_before_any_call() {
        let spec = CompetitionSpec {
            providers: Vec::new(),
            mode: CompetitionMode::Cascade,
            judges: Vec::new(),
            rubric: RubricSpec::new(),
            system: None,
        };
        let err = Competition::new()
            .compete(&Conversation::from_prompt("s", "hi"), &spec)
            .await
            .unwrap_err();
        assert!(matches!(err, CompetitionError::UnsupportedMode(ref m) if m == "cascade"));
    }

    #[tokio::test]
    async fn test_no_providers() {
        let spec = CompetitionSpec::round_robin(Vec::new(), Vec::new(), RubricSpec::new());
        let err = Competition::new()
            .compete(&Conversation::from_prompt("s", "hi"), &spec)
            .await
            .unwrap_err();
        assert!(matches!(err, CompetitionError::NoProviders));
    }
}
