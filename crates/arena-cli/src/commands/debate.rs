//! Debate command - respond / critique / refine between two providers
//!
//! Usage:
//! ```bash
//! arena debate --provider-a openai/gpt-4o-mini --provider-b anthropic --prompt "Why Rust?"
//! arena debate --provider-a mock --provider-b mock --prompt "2+2?" --rounds 2 \
//!     --judge llm --judge-provider openai/gpt-4o-mini
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use arena_adversarial::{
    DebateConfig, DebateCoordinator, DebateJudge, DebateState, HeuristicJudge, LlmJudge,
    RubricDebateJudge, RubricSpec,
};
use arena_llm::ProviderRegistry;
use clap::{Args, ValueEnum};
use colored::Colorize;

use super::GlobalArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum JudgeKind {
    Heuristic,
    Llm,
}

/// Arguments for the debate command
#[derive(Args)]
pub struct DebateArgs {
    /// First party, `provider` or `provider/model`
    #[arg(long)]
    provider_a: String,

    /// Second party, `provider` or `provider/model`
    #[arg(long)]
    provider_b: String,

    /// The question to debate
    #[arg(long)]
    prompt: String,

    /// Number of respond/critique/refine rounds
    #[arg(long, default_value_t = 1)]
    rounds: u32,

    /// How the final answers are judged
    #[arg(long, value_enum, default_value = "heuristic")]
    judge: JudgeKind,

    /// Judge model for `--judge llm`, `provider/model`
    #[arg(long)]
    judge_provider: Option<String>,
}

/// Run the debate command
pub async fn run(global: &GlobalArgs, args: DebateArgs) -> Result<()> {
    let (config, _) = global.load_config()?;
    let registry = config.build_registry();
    let judge = build_judge(&registry, &args).await?;

    let coordinator = DebateCoordinator::new(registry)
        .with_judge(judge)
        .with_trace_sink(global.trace_sink(&config));

    let debate = DebateConfig::new(&args.provider_a, &args.provider_b, &args.prompt, args.rounds);
    let state = coordinator
        .run_debate(&debate)
        .await
        .context("Debate failed")?;

    print_debate(&debate, &state);
    Ok(())
}

async fn build_judge(registry: &ProviderRegistry, args: &DebateArgs) -> Result<Arc<dyn DebateJudge>> {
    match args.judge {
        JudgeKind::Heuristic => Ok(Arc::new(RubricDebateJudge::new(
            HeuristicJudge::new(),
            RubricSpec::new().weight("length", 1.0).weight("structure", 1.0),
        ))),
        JudgeKind::Llm => {
            let target = args
                .judge_provider
                .as_deref()
                .context("--judge llm requires --judge-provider")?;
            let (provider, model) = registry
                .resolve(target)
                .await
                .with_context(|| format!("Cannot resolve judge provider {}", target))?;
            Ok(Arc::new(RubricDebateJudge::new(
                LlmJudge::new(provider, &model),
                RubricSpec::new()
                    .weight("accuracy", 1.0)
                    .weight("reasoning", 1.0)
                    .weight("clarity", 1.0),
            )))
        }
    }
}

fn print_debate(config: &DebateConfig, state: &DebateState) {
    println!("{} {}", "⚔ Debate:".bold().cyan(), state.prompt);
    println!(
        "  {} {}   {} {}",
        "A:".dimmed(),
        config.provider_a.green(),
        "B:".dimmed(),
        config.provider_b.green()
    );
    println!();

    for round in &state.rounds {
        println!("{}", format!("── Round {} ──", round.turn).bold());
        println!("{}", "A responds:".cyan());
        println!("{}", round.provider_a_response);
        println!();
        println!("{}", "B critiques:".cyan());
        println!("{}", round.provider_b_critique);
        println!();
        println!("{}", "A refines:".cyan());
        println!("{}", round.provider_a_refined);
        println!();
    }

    match (state.winner, state.scores, &state.verdicts) {
        (Some(winner), Some(scores), verdicts) => {
            println!(
                "{} {}   (A {:.3} / B {:.3})",
                "Winner:".bold(),
                winner.to_string().green().bold(),
                scores.a,
                scores.b
            );
            if let Some(verdicts) = verdicts {
                println!("  {} {}", "A:".dimmed(), verdicts.a.reasoning);
                println!("  {} {}", "B:".dimmed(), verdicts.b.reasoning);
            }
        }
        _ => println!("{}", "No verdict".yellow()),
    }
}
