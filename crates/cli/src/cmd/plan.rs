//! Show the execution order of a batch

use anyhow::{Context, Result};
use cli_lib::batch;
use owo_colors::OwoColorize;
use quire_core::VaultAction;
use std::path::Path;

pub async fn run(batch_path: &Path) -> Result<()> {
    let actions = batch::load(batch_path)?;
    let submitted = actions.len();

    let sorted = dispatch::plan(actions)
        .await
        .context("Failed to plan batch")?;

    print_plan(&sorted, submitted);
    Ok(())
}

/// Numbered execution order plus a collapse summary
pub fn print_plan(sorted: &[VaultAction], submitted: usize) {
    println!("{}", "Execution Plan".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if sorted.is_empty() {
        println!("  {}", "Nothing to do".dimmed());
        return;
    }

    let width = sorted.len().to_string().len();
    for (i, action) in sorted.iter().enumerate() {
        println!("  {:>width$}. {}", i + 1, describe(action), width = width);
    }

    println!();
    println!(
        "{}",
        format!(
            "{} action(s) submitted, {} after collapsing",
            submitted,
            sorted.len()
        )
        .dimmed()
    );
}

/// Action rendering with the kind colored by effect
fn describe(action: &VaultAction) -> String {
    let kind = action.kind().to_string();
    let kind = if action.is_trash() {
        kind.red().to_string()
    } else if action.is_rename() {
        kind.yellow().to_string()
    } else {
        kind.green().to_string()
    };

    if action.is_rename() {
        format!("{} {} → {}", kind, action.source(), action.destination().cyan())
    } else {
        format!("{} {}", kind, action.source().cyan())
    }
}
