//! Models command - list models per configured provider

use anyhow::Result;
use arena_runtime::list_models;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};

use super::GlobalArgs;

/// Run the models command
pub async fn run(global: &GlobalArgs) -> Result<()> {
    let (config, _) = global.load_config()?;
    let registry = config.build_registry();
    let models = list_models(&registry).await;

    println!("{}", "Configured providers".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Provider").fg(Color::Cyan),
            Cell::new("Models").fg(Color::Cyan),
        ]);

    for (provider, ids) in &models {
        let listed = if ids.is_empty() {
            "(none)".to_string()
        } else {
            ids.join("\n")
        };
        table.add_row(vec![Cell::new(provider).fg(Color::Green), Cell::new(listed)]);
    }

    println!("{table}");
    println!();
    println!("Target a model: {}", "<provider>/<model>".green());
    Ok(())
}
