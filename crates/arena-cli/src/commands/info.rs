//! Info command - Show version and configuration

use anyhow::Result;
use colored::Colorize;

use super::{ConfigSource, GlobalArgs};

/// Run the info command
pub fn run(global: &GlobalArgs) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    println!("{}", "Arena - LLM competitions and debates".bold().cyan());
    println!("{}", "═".repeat(50).cyan());
    println!();

    println!("{}", "Version Information:".bold());
    println!("  {} {}", "CLI Version:".dimmed(), version.green());
    println!();

    println!("{}", "Features:".bold());
    println!("  {} Round-robin competitions with weighted judges", "✓".green());
    println!("  {} Heuristic and model-backed judges", "✓".green());
    println!("  {} Respond / critique / refine debates", "✓".green());
    println!("  {} Structured trace events (--trace json|pretty)", "✓".green());
    println!();

    let (config, source) = global.load_config()?;
    println!("{}", "Configuration:".bold());
    match source {
        ConfigSource::File(path) => {
            println!("  {} {}", "Source:".dimmed(), path.display().to_string().green())
        }
        ConfigSource::Environment => println!(
            "  {} {}",
            "Source:".dimmed(),
            "environment (OPENAI_API_KEY, ANTHROPIC_API_KEY, GOOGLE_API_KEY, XAI_API_KEY, DEEPSEEK_API_KEY, ARENA_LOCAL_URL)"
                .green()
        ),
    }
    println!(
        "  {} {:?}",
        "Trace min level:".dimmed(),
        global.trace_level.unwrap_or(config.trace.min_level)
    );
    println!();

    println!("{}", "Providers:".bold());
    let registry = config.build_registry();
    for name in registry.names() {
        println!("  {} {}", "•".cyan(), name.green());
    }
    println!();

    Ok(())
}
