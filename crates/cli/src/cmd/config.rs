//! Configuration management command
//!
//! View and edit `<vault>/.quire/config.toml`.

use anyhow::{Context, Result};
use cli_lib::config::{self, KEYS, TTL_RANGE_MS};
use owo_colors::OwoColorize;
use std::path::Path;

/// List all configuration values
pub async fn run_show(root: &Path) -> Result<()> {
    let config = config::load(root)?;
    let config_path = config::config_file_path(root);

    println!("{}", "Vault Configuration".bold());
    let location = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("{} (not created, using defaults)", config_path.display())
    };
    println!("{}: {}\n", "Location".dimmed(), location.dimmed());

    println!("{}", "[dispatch]".yellow());
    println!(
        "  {} = {} {}",
        "self_event_ttl_ms".cyan(),
        config.dispatch.self_event_ttl_ms,
        format!("({:.1}s)", config.dispatch.self_event_ttl_ms as f64 / 1000.0).dimmed()
    );

    println!("\n{}", "[store]".yellow());
    println!("  {} = {}", "trash".cyan(), config::trash_name(config.store.trash));

    println!("\n{}", "[ignore]".yellow());
    println!("  {} = {}", "use_quireignore".cyan(), config.ignore.use_quireignore);
    println!(
        "  {} = {}",
        "additional_patterns".cyan(),
        if config.ignore.additional_patterns.is_empty() {
            "(none)".dimmed().to_string()
        } else {
            config.ignore.additional_patterns.join(", ")
        }
    );

    println!("\n{}", "[log]".yellow());
    println!(
        "  {} = {}",
        "file".cyan(),
        match &config.log.file {
            Some(file) => file.display().to_string(),
            None => "(stderr)".dimmed().to_string(),
        }
    );

    println!("\n{}", "Valid Ranges:".bold());
    println!(
        "  self_event_ttl_ms: {}-{}",
        TTL_RANGE_MS.start(),
        TTL_RANGE_MS.end()
    );
    println!("  trash: local | delete");

    Ok(())
}

/// Get a single configuration value
pub async fn run_get(root: &Path, key: &str) -> Result<()> {
    let config = config::load(root)?;
    println!("{}", config.get(key)?);
    Ok(())
}

/// Set a configuration value
pub async fn run_set(root: &Path, key: &str, value: &str) -> Result<()> {
    let mut config = config::load(root)?;
    config.set(key, value)?;

    // Validate before saving
    config
        .validate()
        .context("Invalid configuration value")?;

    config::save(root, &config)?;
    println!("{} {} = {}", "✓".green(), key.cyan(), value);
    Ok(())
}

/// Show the config file path
pub async fn run_path(root: &Path) -> Result<()> {
    let config_path = config::config_file_path(root);
    println!("{}", config_path.display());
    if !config_path.exists() {
        println!("{}", "File does not exist. Use 'quire config init' to create it.".yellow());
    }
    Ok(())
}

/// Create the config file with defaults
pub async fn run_init(root: &Path) -> Result<()> {
    let config_path = config::config_file_path(root);
    if config::init_if_missing(root)? {
        println!("{} Created config file at: {}", "✓".green(), config_path.display());
    } else {
        println!("Config file already exists: {}", config_path.display());
    }
    Ok(())
}

/// Show example configuration
pub async fn run_example() -> Result<()> {
    println!("{}", config::example_config());
    println!("{}", format!("Keys: {}", KEYS.join(", ")).dimmed());
    Ok(())
}

