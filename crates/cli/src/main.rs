//! Quire CLI - quire command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli_lib::{config, vault};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod cmd;

/// Quire - Batched, ordered edits to a markdown vault
#[derive(Parser)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Vault root (default: current directory)
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a batch of actions to the vault
    Apply {
        /// Batch file (.json or .toml)
        batch: PathBuf,
        /// Print the execution plan without touching the vault
        #[arg(long)]
        dry_run: bool,
        /// Keep watching afterwards; the batch's own changes are not reported
        #[arg(long, conflicts_with = "dry_run")]
        watch: bool,
    },
    /// Show the execution plan for a batch
    Plan {
        /// Batch file (.json or .toml)
        batch: PathBuf,
    },
    /// Print changes made to the vault by other programs
    ///
    /// Suppression only covers batches applied by the same process, so
    /// changes from a separate `quire apply` show up here. Use
    /// `apply --watch` to apply a batch and keep watching.
    Watch,
    /// Manage vault configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show all configuration values
    Show,
    /// Get a configuration value
    Get {
        /// Config key (e.g., dispatch.self_event_ttl_ms)
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// Show config file path
    Path,
    /// Create the config file with defaults
    Init,
    /// Print an example configuration
    Example,
}

/// Log to the configured file when there is one, stderr otherwise.
/// `RUST_LOG` overrides the default `warn` level.
fn init_tracing(root: &Path) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // A broken config is reported by the command itself
    let log_file = config::load(root).ok().and_then(|c| c.log_file(root));

    match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or(Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let name = path.file_name().context("log.file must name a file")?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = vault::resolve_root(cli.vault.as_deref())?;
    let _guard = init_tracing(&root)?;

    match cli.command {
        Commands::Apply {
            batch,
            dry_run,
            watch,
        } => cmd::apply::run(&root, &batch, dry_run, watch).await,
        Commands::Plan { batch } => cmd::plan::run(&batch).await,
        Commands::Watch => cmd::watch::run(&root).await,
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show => cmd::config::run_show(&root).await,
            ConfigCommands::Get { key } => cmd::config::run_get(&root, &key).await,
            ConfigCommands::Set { key, value } => cmd::config::run_set(&root, &key, &value).await,
            ConfigCommands::Path => cmd::config::run_path(&root).await,
            ConfigCommands::Init => cmd::config::run_init(&root).await,
            ConfigCommands::Example => cmd::config::run_example().await,
        },
    }
}
