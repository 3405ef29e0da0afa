//! Print external changes to the vault

use anyhow::Result;
use cli_lib::{config, vault};
use dispatch::Dispatcher;
use owo_colors::OwoColorize;
use quire_core::{EventKind, VaultEvent};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

pub async fn run(root: &Path) -> Result<()> {
    let config = config::load(root)?;
    let store = vault::open_store(root, &config, true)?;
    let dispatcher = Dispatcher::new(Arc::new(store), config.dispatcher_config());
    follow(root, dispatcher.subscribe()).await;
    Ok(())
}

/// Print external changes until Ctrl-C or the store shuts down
pub async fn follow(root: &Path, mut events: broadcast::Receiver<VaultEvent>) {
    println!("Watching {} (Ctrl-C to stop)", root.display().to_string().cyan());

    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => println!("{}", render(&event)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Fell behind, {} notifications skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }
}

fn render(event: &VaultEvent) -> String {
    match event.kind {
        EventKind::Created => format!("{} {}", "+".green(), event.path),
        EventKind::Modified => format!("{} {}", "~".yellow(), event.path),
        EventKind::Deleted => format!("{} {}", "-".red(), event.path),
        EventKind::Renamed => format!(
            "{} {} → {}",
            "→".cyan(),
            event.from_path.as_deref().unwrap_or("?"),
            event.path
        ),
    }
}
