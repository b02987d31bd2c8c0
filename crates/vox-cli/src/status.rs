//! `vox status` — show configured models, providers, and quota ceilings.

use anyhow::Result;
use colored::Colorize;

use vox_core::config::load_config;
use vox_core::utils::get_data_path;

const PROVIDER_NAMES: &[&str] = &["google", "anthropic", "groq", "ollama"];

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_data_path().join("config.json");

    println!();
    println!("{}", "🎙 Vox Status".cyan().bold());
    println!();

    // Config
    let config_exists = config_path.exists();
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_exists {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Assistant
    println!("  {:<18} {}", "Assistant:".bold(), config.assistant.name);
    println!(
        "  {:<18} {}",
        "Wake phrases:".bold(),
        config.assistant.wake_phrases.join(", ").dimmed()
    );

    // Models
    println!();
    println!("  {}", "Models:".bold());
    if config.models.is_empty() {
        println!("    {}", "(none configured)".dimmed());
    }
    for model in &config.models {
        println!(
            "    {:<20} {} {}",
            model.model_id,
            format!("[{}]", model.provider).dimmed(),
            format!(
                "{} rpm, tags: {}",
                model.rate_per_minute,
                model.capability_tags.join(", ")
            )
            .dimmed()
        );
    }

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for name in PROVIDER_NAMES {
        let status = match config.providers.get_by_name(name) {
            Some(p) if p.is_configured() => format!("{} (key set)", "✓".green()),
            // Ollama needs no key, only a reachable daemon
            Some(_) if *name == "ollama" => format!("{}", "local, no key needed".dimmed()),
            _ => format!("{}", "· not configured".dimmed()),
        };
        println!("    {:<20} {}", name, status);
    }

    // Quota ceilings
    println!();
    println!(
        "  {:<18} {}",
        "Quota:".bold(),
        format!(
            "rpm: {} | tpm: {} | rpd: {}",
            config.quota.rpm, config.quota.tpm, config.quota.rpd
        )
        .dimmed()
    );

    println!();
    Ok(())
}
