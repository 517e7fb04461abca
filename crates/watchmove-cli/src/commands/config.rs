use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{presets, Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;
use watchmove_config::Config;

/// Keep the first and last few characters of a secret
pub fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

/// Print the effective configuration (defaults, file, environment and flags merged)
pub fn show_config(config: &Config, source: Option<&Path>, full: bool, output: &Output) -> Result<()> {
    let mut shown = config.clone();
    if !full {
        shown.trakt.client_id = mask_string(&shown.trakt.client_id);
    }
    let toml = shown
        .to_toml()
        .map_err(|e| color_eyre::eyre::eyre!("Could not render configuration: {:#}", e))?;
    let source_display = source
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none, built-in defaults)".to_string());

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }
            let mut info_table = Table::new();
            info_table.load_preset(presets::UTF8_FULL_CONDENSED);
            info_table.add_row(vec![Cell::new("Config file"), Cell::new(&source_display)]);
            info_table.add_row(vec![
                Cell::new("Lookup providers"),
                Cell::new(config.enabled_providers().join(", ")),
            ]);
            println!("{}", info_table);
            println!();
            println!("{}", "Effective configuration".bright_cyan().bold());
            println!("{}", toml);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "config_file": source.map(|p| p.display().to_string()),
                "lookup_providers": config.enabled_providers(),
                "config": toml,
            }));
        }
    }
    Ok(())
}
