//! Model-backed judge
//!
//! Asks a provider to grade a candidate and parses the JSON object out of its
//! reply. Any failure, from the provider call to the parse, yields the
//! fallback score instead of an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use arena_core::{Conversation, Role};
use arena_llm::{ChatProvider, ChatRequest};
use async_trait::async_trait;
use serde::Deserialize;

use crate::judge::{Candidate, Judge, JudgeError, RubricSpec, Score};

/// Reasoning attached to the fallback score
pub const FALLBACK_REASONING: &str = "Failed to parse LLM response";

const JUDGE_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Deserialize)]
struct JudgeReply {
    total: f64,
    #[serde(default)]
    breakdown: BTreeMap<String, f64>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Judge that delegates grading to a model
#[derive(Debug, Clone)]
pub struct LlmJudge {
    provider: Arc<dyn ChatProvider>,
    model: String,
}

impl LlmJudge {
    pub const NAME: &'static str = "llm";

    pub fn new(provider: Arc<dyn ChatProvider>, model: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// The score returned whenever grading fails
    pub fn fallback_score() -> Score {
        Score {
            total: 0.5,
            breakdown: BTreeMap::new(),
            reasoning: Some(FALLBACK_REASONING.to_string()),
        }
    }

    fn build_prompt(candidate: &Candidate, rubric: &RubricSpec) -> String {
        let question = candidate
            .question
            .as_deref()
            .map(|q| format!("Question asked:\n\"\"\"\n{}\n\"\"\"\n\n", q))
            .unwrap_or_default();
        let criteria: Vec<&str> = rubric.weights.keys().map(String::as_str).collect();
        let breakdown_shape = criteria
            .iter()
            .map(|k| format!("\"{}\": <number between 0 and 1>", k))
            .collect::<Vec<_>>()
            .join(",\n    ");

        format!(
            r#"You are a judge evaluating AI-generated responses.

Score the following response on these criteria: {}

{}Response to evaluate:
"""
{}
"""

Provide your evaluation as JSON with this exact structure:
{{
  "total": <number between 0 and 1>,
  "breakdown": {{
    {}
  }},
  "reasoning": "<brief explanation>"
}}"#,
            criteria.join(", "),
            question,
            candidate.text,
            breakdown_shape
        )
    }

    /// Parse the first JSON object in a reply into a score.
    ///
    /// Anything after the object, braces included, is ignored.
    pub fn parse_reply(text: &str) -> Option<Score> {
        let start = text.find('{')?;
        let first = serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<JudgeReply>()
            .next()?;

        match first {
            Ok(reply) => Some(Score {
                total: reply.total,
                breakdown: reply.breakdown,
                reasoning: reply.reasoning,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Judge reply is not a score object");
                None
            }
        }
    }
}

#[async_trait]
impl Judge for LlmJudge {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, candidate: &Candidate, rubric: &RubricSpec) -> Result<Score, JudgeError> {
        let prompt = Self::build_prompt(candidate, rubric);
        let conversation = Conversation::generated("judge").append(Role::User, &prompt, None);
        let request =
            ChatRequest::new(conversation, &self.model).with_temperature(JUDGE_TEMPERATURE);

        let reply = match self.provider.chat(request).await {
            Ok(response) => response.output_text,
            Err(e) => {
                tracing::warn!(
                    provider = %self.provider.name(),
                    model = %self.model,
                    error = %e,
                    "LLM judge call failed"
                );
                metrics::counter!("arena_judge_fallbacks_total").increment(1);
                return Ok(Self::fallback_score());
            }
        };

        Ok(Self::parse_reply(&reply).unwrap_or_else(|| {
            tracing::warn!(candidate = %candidate.id, "Failed to parse LLM judge response");
            metrics::counter!("arena_judge_fallbacks_total").increment(1);
            Self::fallback_score()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_llm::MockProvider;

    fn rubric() -> RubricSpec {
        RubricSpec::new().weight("accuracy", 1.0).weight("clarity", 0.5)
    }

    #[test]
    fn test_prompt_lists_criteria() {
        let prompt = LlmJudge::build_prompt(&Candidate::new("p", "m", "the answer"), &rubric());
        assert!(prompt.contains("on these criteria: accuracy, clarity"));
        assert!(prompt.contains("\"accuracy\": <number between 0 and 1>"));
        assert!(prompt.contains("the answer"));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"total\": 0.9, \"breakdown\": {\"accuracy\": 1.0}, \"reasoning\": \"solid\"}\n```";
        let score = LlmJudge::parse_reply(reply).unwrap();
        assert_eq!(score.total, 0.9);
        assert_eq!(score.breakdown["accuracy"], 1.0);
        assert_eq!(score.reasoning.as_deref(), Some("solid"));
    }

    #[test]
    fn test_prompt_includes_question_when_present() {
        let candidate = Candidate::new("p", "m", "42").with_question("What is six times seven?");
        let prompt = LlmJudge::build_prompt(&candidate, &rubric());
        assert!(prompt.contains("Question asked:\n\"\"\"\nWhat is six times seven?"));
        assert!(prompt.find("six times seven").unwrap() < prompt.find("Response to evaluate").unwrap());

        let bare = LlmJudge::build_prompt(&Candidate::new("p", "m", "42"), &rubric());
        assert!(!bare.contains("Question asked"));
    }

    #[test]
    fn test_parse_ignores_braces_after_object() {
        let reply = "{\"total\":0.9,\"breakdown\":{\"accuracy\":0.9},\"reasoning\":\"solid\"}\n\nNote: scale is {0..1}.";
        let score = LlmJudge::parse_reply(reply).unwrap();
        assert_eq!(score.total, 0.9);
        assert_eq!(score.breakdown["accuracy"], 0.9);
        assert_eq!(score.reasoning.as_deref(), Some("solid"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(LlmJudge::parse_reply("no json here").is_none());
        assert!(LlmJudge::parse_reply("} backwards {").is_none());
        assert!(LlmJudge::parse_reply("{\"breakdown\": {}}").is_none());
    }

    #[tokio::test]
    async fn test_score_uses_low_temperature_and_fresh_conversation() {
        let mock = Arc::new(MockProvider::constant(
            r#"{"total": 0.8, "breakdown": {"accuracy": 0.8}, "reasoning": "ok"}"#,
        ));
        let judge = LlmJudge::new(mock.clone(), "judge-model");

        let score = judge
            .score(&Candidate::new("p", "m", "text"), &rubric())
            .await
            .unwrap();
        assert_eq!(score.total, 0.8);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "judge-model");
        assert_eq!(requests[0].temperature, Some(0.3));
        assert_eq!(requests[0].conversation.len(), 1);
        assert!(requests[0].conversation.session_id.starts_with("judge-"));
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back() {
        let judge = LlmJudge::new(Arc::new(MockProvider::constant("I refuse to grade.")), "m");
        let score = judge
            .score(&Candidate::new("p", "m", "text"), &rubric())
            .await
            .unwrap();
        assert_eq!(score, LlmJudge::fallback_score());
        assert_eq!(score.reasoning.as_deref(), Some(FALLBACK_REASONING));
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let judge = LlmJudge::new(Arc::new(MockProvider::failing("down", "503")), "m");
        let score = judge
            .score(&Candidate::new("p", "m", "text"), &rubric())
            .await
            .unwrap();
        assert_eq!(score.total, 0.5);
        assert!(score.breakdown.is_empty());
    }

    #[tokio::test]
    async fn test_mock_canned_judge_reply_parses() {
        let judge = LlmJudge::new(Arc::new(MockProvider::named("mock")), "m");
        let score = judge
            .score(&Candidate::new("p", "m", "text"), &rubric())
            .await
            .unwrap();
        assert_eq!(score.total, 0.75);
        assert_eq!(score.reasoning.as_deref(), Some("Mock evaluation"));
    }
}
