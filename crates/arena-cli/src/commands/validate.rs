//! Validate command - check a conversation payload
//!
//! Usage:
//! ```bash
//! arena validate conversation.json
//! ```

use std::path::PathBuf;

use anyhow::Result;
use arena_core::validate;
use clap::Args;
use colored::Colorize;

use super::read_json;

/// Arguments for the validate command
#[derive(Args)]
pub struct ValidateArgs {
    /// Conversation file (JSON)
    file: PathBuf,
}

/// Run the validate command; exits with status 1 when invalid
pub fn run(args: ValidateArgs) -> Result<()> {
    let raw = read_json(&args.file)?;
    let result = validate(&raw);

    if let Some(conversation) = result.data.as_ref().filter(|_| result.valid) {
        crate::print_success(&format!(
            "{} is valid ({} messages, session {})",
            args.file.display(),
            conversation.len(),
            conversation.session_id.cyan()
        ));
        return Ok(());
    }

    crate::print_error(&format!("{} is invalid", args.file.display()));
    for error in result.errors() {
        println!("  {} {}", "•".red(), error);
    }
    std::process::exit(1);
}
