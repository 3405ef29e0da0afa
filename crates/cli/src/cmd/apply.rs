//! Apply a batch to the vault

use crate::cmd::plan::print_plan;
use crate::cmd::watch::follow;
use anyhow::{Context, Result};
use cli_lib::{batch, config, vault};
use dispatch::{DispatchError, DispatchReport, Dispatcher};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;

pub async fn run(root: &Path, batch_path: &Path, dry_run: bool, watch: bool) -> Result<()> {
    let config = config::load(root)?;
    let actions = batch::load(batch_path)?;
    let submitted = actions.len();

    if dry_run {
        let sorted = dispatch::plan(actions)
            .await
            .context("Failed to plan batch")?;
        print_plan(&sorted, submitted);
        println!("{}", "Dry run: nothing was applied".yellow());
        return Ok(());
    }

    // Echoes of the batch are only suppressed when the store is watched
    let store = vault::open_store(root, &config, watch)?;
    let dispatcher = Dispatcher::new(Arc::new(store), config.dispatcher_config());
    let events = dispatcher.subscribe();

    let outcome = match dispatcher.dispatch(actions).await {
        Err(e @ DispatchError::Cycle { .. }) => {
            return Err(anyhow::Error::new(e).context("Batch aborted before execution"));
        }
        result => report(result, submitted),
    };

    if watch {
        follow(root, events).await;
    }
    outcome
}

fn report(result: dispatch::Result<DispatchReport>, submitted: usize) -> Result<()> {
    match result {
        Ok(report) => {
            println!(
                "{} Applied {} action(s) ({} submitted)",
                "✓".green(),
                report.executed,
                report.submitted
            );
            Ok(())
        }
        Err(DispatchError::Partial(failures)) => {
            for failure in &failures {
                println!(
                    "{} {}: {}",
                    "✗".red(),
                    failure.action,
                    failure.error.red()
                );
            }
            anyhow::bail!(
                "{} of {} action(s) failed; the rest were applied",
                failures.len(),
                submitted
            )
        }
        Err(e) => Err(e.into()),
    }
}
