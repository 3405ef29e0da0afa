//! Locating and opening a vault

use crate::config::VaultConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use watcher::FsStore;

/// Canonical vault root: `--vault` if given, the current directory otherwise
pub fn resolve_root(vault: Option<&Path>) -> Result<PathBuf> {
    let root = match vault {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let root = root
        .canonicalize()
        .with_context(|| format!("Vault not found: {}", root.display()))?;
    if !root.is_dir() {
        anyhow::bail!("Vault is not a directory: {}", root.display());
    }
    Ok(root)
}

/// Open the vault's store; `watched` also starts forwarding disk changes
pub fn open_store(root: &Path, config: &VaultConfig, watched: bool) -> Result<FsStore> {
    let options = config.store_options();
    let store = if watched {
        FsStore::open_watched(root, options)
    } else {
        FsStore::open(root, options)
    };
    store.with_context(|| format!("Failed to open vault at {}", root.display()))
}
