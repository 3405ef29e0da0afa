//! Common utilities for integration tests

pub mod cli;

use anyhow::Result;
use std::path::Path;
use tempfile::TempDir;

/// Empty vault directory
pub fn vault() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Write a batch file into `dir`
pub fn write_batch(dir: &Path, name: &str, contents: &str) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
