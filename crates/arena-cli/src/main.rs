//! Arena CLI - run competitions and debates between LLM providers
//!
//! # Usage
//!
//! ```bash
//! # Rank providers on a conversation
//! arena compete --request request.json
//!
//! # Two-party debate with a heuristic verdict
//! arena debate --provider-a openai/gpt-4o-mini --provider-b anthropic --prompt "What is 2+2?"
//!
//! # Check a conversation payload
//! arena validate conversation.json
//!
//! # Show configured providers and their models
//! arena models
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use commands::{compete, debate, info, models, validate, GlobalArgs};

/// Arena - competitive evaluation of LLM providers
#[derive(Parser)]
#[command(
    name = "arena",
    version,
    about = "Arena CLI - LLM competitions and debates",
    long_about = "Arena fans a conversation out to several providers and ranks the answers\n\
                  with pluggable judges, or runs a respond/critique/refine debate\n\
                  between two providers and declares a winner."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a round-robin competition from a request file
    #[command(name = "compete")]
    Compete(compete::CompeteArgs),

    /// Run a debate between two providers
    #[command(name = "debate")]
    Debate(debate::DebateArgs),

    /// Validate a conversation file
    #[command(name = "validate")]
    Validate(validate::ValidateArgs),

    /// List models per configured provider
    #[command(name = "models")]
    Models,

    /// Show version and configuration
    #[command(name = "info")]
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Compete(args) => compete::run(&cli.global, args).await,
        Commands::Debate(args) => debate::run(&cli.global, args).await,
        Commands::Validate(args) => validate::run(args),
        Commands::Models => models::run(&cli.global).await,
        Commands::Info => info::run(&cli.global),
    }
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

/// Print a success message with a checkmark
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message with an X
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}
