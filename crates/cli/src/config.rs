//! Per-vault configuration
//!
//! Stored at `<vault>/.quire/config.toml`. A missing file means defaults;
//! every load is validated before use.

use anyhow::{Context, Result};
use dispatch::DispatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use watcher::{FsStoreOptions, IgnoreConfig, TrashMode};

/// Hidden folder holding vault-local state
pub const QUIRE_DIR: &str = ".quire";

const CONFIG_FILE: &str = "config.toml";

/// Allowed range for `dispatch.self_event_ttl_ms`
pub const TTL_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=600_000;

/// Keys accepted by `quire config get/set`
pub const KEYS: &[&str] = &[
    "dispatch.self_event_ttl_ms",
    "store.trash",
    "ignore.use_quireignore",
    "ignore.additional_patterns",
    "log.file",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub ignore: IgnoreConfig,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSection {
    /// How long a self-event registration waits for its echo
    #[serde(default = "default_ttl_ms")]
    pub self_event_ttl_ms: u64,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            self_event_ttl_ms: default_ttl_ms(),
        }
    }
}

fn default_ttl_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub trash: TrashMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSection {
    /// Log file, relative to the vault root; stderr when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl VaultConfig {
    /// Reject out-of-range values
    pub fn validate(&self) -> Result<()> {
        if !TTL_RANGE_MS.contains(&self.dispatch.self_event_ttl_ms) {
            anyhow::bail!(
                "dispatch.self_event_ttl_ms must be between {} and {} (got {})",
                TTL_RANGE_MS.start(),
                TTL_RANGE_MS.end(),
                self.dispatch.self_event_ttl_ms
            );
        }
        for pattern in &self.ignore.additional_patterns {
            if pattern.trim().is_empty() {
                anyhow::bail!("ignore.additional_patterns must not contain empty patterns");
            }
        }
        if let Some(file) = &self.log.file {
            if file.as_os_str().is_empty() {
                anyhow::bail!("log.file must not be empty");
            }
        }
        Ok(())
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            self_event_ttl: Duration::from_millis(self.dispatch.self_event_ttl_ms),
        }
    }

    pub fn store_options(&self) -> FsStoreOptions {
        FsStoreOptions {
            trash: self.store.trash,
            ignore: self.ignore.clone(),
        }
    }

    /// Absolute log file path, if file logging is configured
    pub fn log_file(&self, vault: &Path) -> Option<PathBuf> {
        self.log.file.as_ref().map(|file| vault.join(file))
    }

    /// Current value of `key`, rendered as `config set` accepts it
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "dispatch.self_event_ttl_ms" => self.dispatch.self_event_ttl_ms.to_string(),
            "store.trash" => trash_name(self.store.trash).to_string(),
            "ignore.use_quireignore" => self.ignore.use_quireignore.to_string(),
            "ignore.additional_patterns" => self.ignore.additional_patterns.join(","),
            "log.file" => self
                .log
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'quire config show' to see available keys.",
                key
            ),
        };
        Ok(value)
    }

    /// Update `key` from its string form (not validated)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "dispatch.self_event_ttl_ms" => {
                self.dispatch.self_event_ttl_ms = value
                    .parse()
                    .context("Invalid value: must be a positive integer (milliseconds)")?;
            }
            "store.trash" => {
                self.store.trash = match value {
                    "local" => TrashMode::Local,
                    "delete" => TrashMode::Delete,
                    _ => anyhow::bail!("Invalid value: must be 'local' or 'delete'"),
                };
            }
            "ignore.use_quireignore" => {
                self.ignore.use_quireignore = value
                    .parse()
                    .context("Invalid value: must be 'true' or 'false'")?;
            }
            "ignore.additional_patterns" => {
                self.ignore.additional_patterns = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect();
            }
            "log.file" => {
                self.log.file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Use 'quire config show' to see available keys.",
                key
            ),
        }
        Ok(())
    }
}

pub fn trash_name(mode: TrashMode) -> &'static str {
    match mode {
        TrashMode::Local => "local",
        TrashMode::Delete => "delete",
    }
}

/// `<vault>/.quire/config.toml`
pub fn config_file_path(vault: &Path) -> PathBuf {
    vault.join(QUIRE_DIR).join(CONFIG_FILE)
}

/// Load and validate the vault's config, defaulting when absent
pub fn load(vault: &Path) -> Result<VaultConfig> {
    let path = config_file_path(vault);
    if !path.exists() {
        return Ok(VaultConfig::default());
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: VaultConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Write `config`, creating `.quire/` if needed
pub fn save(vault: &Path, config: &VaultConfig) -> Result<()> {
    let path = config_file_path(vault);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// Create a default config file; returns false if one already exists
pub fn init_if_missing(vault: &Path) -> Result<bool> {
    if config_file_path(vault).exists() {
        return Ok(false);
    }
    save(vault, &VaultConfig::default())?;
    Ok(true)
}

/// Commented example configuration
pub fn example_config() -> String {
    format!(
        r#"# Quire vault configuration (.quire/config.toml)

[dispatch]
# How long (ms) a path touched by quire waits for its change notification
# before the notification is treated as external. Range: {}-{}
self_event_ttl_ms = 5000

[store]
# "local" moves trashed nodes into .trash/, "delete" removes them
trash = "local"

[ignore]
use_quireignore = true
additional_patterns = ["*.tmp", "drafts/"]

[log]
# Relative to the vault root; logs go to stderr when unset
# file = ".quire/quire.log"
"#,
        TTL_RANGE_MS.start(),
        TTL_RANGE_MS.end()
    )
}
