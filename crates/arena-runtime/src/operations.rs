//! Name-based operations for outer surfaces
//!
//! These take plain request values (provider names instead of capabilities)
//! and resolve them against an explicit [`ProviderRegistry`].

use std::collections::BTreeMap;
use std::sync::Arc;

use arena_adversarial::{HeuristicJudge, Judge, LlmJudge, RubricSpec};
use arena_core::{Conversation, TokenUsage};
use arena_llm::{ChatRequest, LlmError, ProviderRegistry};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::competition::{
    Competition, CompetitionError, CompetitionMode, CompetitionSpec, ProviderTarget,
};

/// A single provider call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    #[serde(alias = "cnf")]
    pub conversation: Conversation,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResult {
    pub conversation: Conversation,
    pub output_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Call one provider by name
pub async fn invoke(
    registry: &ProviderRegistry,
    request: InvokeRequest,
) -> Result<InvokeResult, LlmError> {
    let provider = registry.get(&request.provider)?;

    let mut chat =
        ChatRequest::new(request.conversation, &request.model).with_system(request.system);
    if let Some(temperature) = request.temperature {
        chat = chat.with_temperature(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        chat = chat.with_max_tokens(max_tokens);
    }

    let response = provider.chat(chat).await?;
    Ok(InvokeResult {
        conversation: response.conversation,
        output_text: response.output_text,
        usage: response.usage,
    })
}

/// A provider/model pair by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderChoice {
    pub name: String,
    pub model: String,
}

/// Which judge to build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JudgeSpec {
    Heuristic,
    Llm {
        #[serde(default)]
        provider: Option<String>,
        #[serde(default)]
        model: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompeteSpec {
    pub providers: Vec<ProviderChoice>,
    pub mode: CompetitionMode,
    #[serde(default)]
    pub rubric: RubricSpec,
    /// Defaults to a single heuristic judge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judges: Option<Vec<JudgeSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompeteRequest {
    #[serde(alias = "cnf")]
    pub conversation: Conversation,
    pub spec: CompeteSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinnerSummary {
    pub id: String,
    pub text: String,
    pub score: f64,
    pub breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub text: String,
    pub score: f64,
}

/// Flattened competition outcome for outer surfaces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompeteSummary {
    pub winner: WinnerSummary,
    pub leaderboard: Vec<LeaderboardEntry>,
}

const DEFAULT_JUDGES: &[JudgeSpec] = &[JudgeSpec::Heuristic];

fn build_judges(
    registry: &ProviderRegistry,
    specs: Option<&[JudgeSpec]>,
) -> Result<Vec<Arc<dyn Judge>>, CompetitionError> {
    let specs = specs.unwrap_or(DEFAULT_JUDGES);

    specs
        .iter()
        .map(|spec| -> Result<Arc<dyn Judge>, CompetitionError> {
            match spec {
                JudgeSpec::Heuristic => Ok(Arc::new(HeuristicJudge::new())),
                JudgeSpec::Llm {
                    provider: Some(provider),
                    model: Some(model),
                } => Ok(Arc::new(LlmJudge::new(registry.get(provider)?, model))),
                JudgeSpec::Llm { .. } => Err(CompetitionError::InvalidJudge(
                    "llm judge requires provider and model".to_string(),
                )),
            }
        })
        .collect()
}

/// Resolve names, run the competition and flatten the result
pub async fn compete_operation(
    registry: &ProviderRegistry,
    competition: &Competition,
    request: CompeteRequest,
) -> Result<CompeteSummary, CompetitionError> {
    let spec = request.spec;
    let judges = build_judges(registry, spec.judges.as_deref())?;

    let providers = spec
        .providers
        .iter()
        .map(|choice| -> Result<ProviderTarget, CompetitionError> {
            Ok(ProviderTarget::new(registry.get(&choice.name)?, &choice.model))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let competition_spec = CompetitionSpec {
        providers,
        mode: spec.mode,
        judges,
        rubric: spec.rubric,
        system: spec.system,
    };

    let result = competition
        .compete(&request.conversation, &competition_spec)
        .await?;

    let breakdown = result
        .trace_for(&result.winner.candidate.id)
        .and_then(|trace| {
            trace
                .score_of(HeuristicJudge::NAME)
                .or_else(|| trace.scores.first().map(|entry| &entry.score))
        })
        .map(|score| score.breakdown.clone())
        .unwrap_or_default();

    Ok(CompeteSummary {
        winner: WinnerSummary {
            id: result.winner.candidate.id.clone(),
            text: result.winner.candidate.text.clone(),
            score: result.winner.score,
            breakdown,
        },
        leaderboard: result
            .leaderboard
            .iter()
            .map(|entry| LeaderboardEntry {
                id: entry.candidate.id.clone(),
                text: entry.candidate.text.clone(),
                score: entry.score,
            })
            .collect(),
    })
}

/// Models per registered provider; a failed listing reports no models
pub async fn list_models(registry: &ProviderRegistry) -> BTreeMap<String, Vec<String>> {
    let providers = registry.providers();
    let listings = join_all(providers.iter().map(|provider| async move {
        let models = provider.list_models().await.unwrap_or_else(|e| {
            tracing::warn!(provider = %provider.name(), error = %e, "Listing models failed");
            Vec::new()
        });
        (provider.name().to_string(), models)
    }))
    .await;

    listings.into_iter().collect()
}
