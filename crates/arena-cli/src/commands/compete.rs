//! Compete command - run a round-robin competition
//!
//! Usage:
//! ```bash
//! arena compete --request request.json
//! arena compete --request request.json --json
//! ```
//!
//! The request file holds `{ "conversation": {...}, "spec": {...} }`
//! (`cnf` is accepted for `conversation`).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use arena_core::validate;
use arena_runtime::{compete_operation, CompeteRequest, CompeteSummary, Competition};
use clap::Args;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::{read_json, GlobalArgs};

/// Arguments for the compete command
#[derive(Args)]
pub struct CompeteArgs {
    /// Competition request file (JSON)
    #[arg(short, long)]
    request: PathBuf,

    /// Output the summary as JSON
    #[arg(long)]
    json: bool,
}

/// Run the compete command
pub async fn run(global: &GlobalArgs, args: CompeteArgs) -> Result<()> {
    let raw = read_json(&args.request)?;

    let conversation = raw
        .get("conversation")
        .or_else(|| raw.get("cnf"))
        .context("Request has no conversation")?;
    let validation = validate(conversation);
    if !validation.valid {
        for error in validation.errors() {
            crate::print_error(&format!("conversation.{}", error));
        }
        bail!("Request conversation is invalid");
    }

    let request: CompeteRequest =
        serde_json::from_value(raw).context("Invalid competition request")?;

    let (config, _) = global.load_config()?;
    let registry = config.build_registry();
    let competition = Competition::new().with_trace_sink(global.trace_sink(&config));

    let summary = compete_operation(&registry, &competition, request)
        .await
        .context("Competition failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &CompeteSummary) {
    println!("{}", "🏆 Leaderboard".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("#").fg(Color::Cyan),
            Cell::new("Candidate").fg(Color::Cyan),
            Cell::new("Score").fg(Color::Cyan),
            Cell::new("Response").fg(Color::Cyan),
        ]);

    for (i, entry) in summary.leaderboard.iter().enumerate() {
        let preview: String = entry.text.chars().take(60).collect();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&entry.id).fg(Color::Green),
            Cell::new(format!("{:.3}", entry.score)).fg(Color::Yellow),
            Cell::new(preview.replace('\n', " ")),
        ]);
    }
    println!("{table}");
    println!();

    println!(
        "{} {} ({:.3})",
        "Winner:".bold(),
        summary.winner.id.green().bold(),
        summary.winner.score
    );
    for (criterion, value) in &summary.winner.breakdown {
        println!("  {} {:.2}", format!("{}:", criterion).dimmed(), value);
    }
}
