//! Deterministic text-shape judge
//!
//! Scores only the criteria the rubric weights: `length`, `keywords` and
//! `structure`. The total is the weighted mean over the criteria that were
//! actually computed.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::judge::{Candidate, Judge, JudgeError, RubricSpec, Score};

/// Rule-based judge. Cannot fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicJudge;

impl HeuristicJudge {
    pub const NAME: &'static str = "heuristic";

    pub fn new() -> Self {
        Self
    }

    /// Pure scoring function behind [`Judge::score`]
    pub fn evaluate(text: &str, rubric: &RubricSpec) -> Score {
        let mut breakdown = BTreeMap::new();

        if rubric.weight_of("length") > 0.0 {
            breakdown.insert("length".to_string(), score_length(text));
        }

        if rubric.weight_of("keywords") > 0.0 {
            if let Some(keywords) = rubric.keywords.as_deref().filter(|k| !k.is_empty()) {
                breakdown.insert("keywords".to_string(), score_keywords(text, keywords));
            }
        }

        if rubric.weight_of("structure") > 0.0 {
            breakdown.insert("structure".to_string(), score_structure(text));
        }

        let (weighted, total_weight) = breakdown.iter().fold((0.0, 0.0), |(sum, w), (k, v)| {
            let weight = rubric.weight_of(k);
            (sum + v * weight, w + weight)
        });

        let total = if total_weight > 0.0 {
            weighted / total_weight
        } else {
            0.0
        };

        Score {
            total,
            breakdown,
            reasoning: None,
        }
    }
}

#[async_trait]
impl Judge for HeuristicJudge {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn score(&self, candidate: &Candidate, rubric: &RubricSpec) -> Result<Score, JudgeError> {
        Ok(Self::evaluate(&candidate.text, rubric))
    }
}

fn score_length(text: &str) -> f64 {
    match text.chars().count() {
        n if n < 50 => 0.2,
        n if n < 80 => 0.6,
        n if n <= 2000 => 1.0,
        _ => 0.8,
    }
}

fn score_keywords(text: &str, keywords: &[String]) -> f64 {
    let lower = text.to_lowercase();
    let found = keywords
        .iter()
        .filter(|kw| lower.contains(&kw.to_lowercase()))
        .count();
    found as f64 / keywords.len() as f64
}

struct StructureRules {
    heading: Regex,
    list: Regex,
    code_block: Regex,
    link: Regex,
    emphasis: Regex,
}

fn structure_rules() -> &'static StructureRules {
    static RULES: OnceLock<StructureRules> = OnceLock::new();
    RULES.get_or_init(|| StructureRules {
        heading: Regex::new(r"(?m)^#{1,3}\s+.+$").expect("heading pattern"),
        list: Regex::new(r"(?m)^[-*]\s+.+$").expect("list pattern"),
        code_block: Regex::new(r"(?s)```.+```").expect("code block pattern"),
        link: Regex::new(r"\[.+\]\(.+\)").expect("link pattern"),
        emphasis: Regex::new(r"\*\*.+\*\*|__.+__").expect("emphasis pattern"),
    })
}

fn score_structure(text: &str) -> f64 {
    let rules = structure_rules();
    let bonuses = [
        (&rules.heading, 0.1),
        (&rules.list, 0.1),
        (&rules.code_block, 0.15),
        (&rules.link, 0.1),
        (&rules.emphasis, 0.05),
    ];

    let score: f64 = bonuses
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .fold(0.5, |acc, (_, bonus)| acc + bonus);
    score.min(1.0)
}
