//! Ignore rules for the on-disk vault
//!
//! Notifications for ignored paths never reach the dispatcher's subscribers.
//! Sources, highest priority first:
//! 1. Built-in patterns (`.quire/`, `.trash/`, `.git/`, `.obsidian/`, editor temp files)
//! 2. `.quireignore` at the vault root (optional, enabled by default)
//! 3. Config-based patterns (gitignore syntax)

use anyhow::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Folders owned by tooling rather than by the vault's content
pub const BUILTIN_IGNORED_DIRS: &[&str] = &[".quire", ".trash", ".git", ".obsidian"];

/// Ignore rule set for one vault root
pub struct IgnoreRules {
    /// Vault root directory
    root: PathBuf,

    /// `.quireignore` patterns (optional)
    quireignore: Option<Gitignore>,

    /// Patterns from config
    additional: Option<Gitignore>,

    config: IgnoreConfig,
}

impl IgnoreRules {
    /// Load ignore rules for the vault at `root`
    pub fn load(root: &Path, config: IgnoreConfig) -> Result<Self> {
        let mut rules = Self {
            root: root.to_path_buf(),
            quireignore: None,
            additional: None,
            config,
        };

        rules.reload()?;
        Ok(rules)
    }

    /// Rebuild matchers from disk and config
    pub fn reload(&mut self) -> Result<()> {
        self.quireignore = None;
        if self.config.use_quireignore {
            let path = self.root.join(".quireignore");
            if path.exists() {
                let mut builder = GitignoreBuilder::new(&self.root);
                if let Some(err) = builder.add(&path) {
                    return Err(err.into());
                }
                self.quireignore = Some(builder.build()?);
            }
        }

        self.additional = None;
        if !self.config.additional_patterns.is_empty() {
            let mut builder = GitignoreBuilder::new(&self.root);
            for pattern in &self.config.additional_patterns {
                builder.add_line(None, pattern)?;
            }
            self.additional = Some(builder.build()?);
        }

        Ok(())
    }

    /// Check whether a vault-relative path should be ignored
    pub fn should_ignore(&self, rel_path: &str) -> bool {
        if is_builtin_ignored(rel_path) {
            return true;
        }

        let path = Path::new(rel_path);
        let is_dir = self.root.join(path).is_dir();

        for matcher in [&self.quireignore, &self.additional].into_iter().flatten() {
            // Check the path itself and every parent, so `build/` covers `build/x`
            if matcher.matched_path_or_any_parents(path, is_dir).is_ignore() {
                return true;
            }
        }

        false
    }

    /// Number of active ignore sources (built-ins always count)
    pub fn active_sources(&self) -> usize {
        1 + usize::from(self.quireignore.is_some()) + usize::from(self.additional.is_some())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Ignore configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Read `.quireignore` at the vault root (default: true)
    #[serde(default = "default_true")]
    pub use_quireignore: bool,

    /// Additional gitignore-style patterns
    #[serde(default)]
    pub additional_patterns: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            use_quireignore: true,
            additional_patterns: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}

fn is_builtin_ignored(rel_path: &str) -> bool {
    if rel_path
        .split('/')
        .any(|segment| BUILTIN_IGNORED_DIRS.contains(&segment))
    {
        return true;
    }

    let file_name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    is_editor_temp(file_name)
}

/// Vim swap/backup, Emacs autosave/lock, OS metadata
fn is_editor_temp(file_name: &str) -> bool {
    file_name.ends_with(".swp")
        || file_name.ends_with(".swo")
        || file_name.ends_with('~')
        || (file_name.starts_with('#') && file_name.ends_with('#'))
        || file_name.starts_with(".#")
        || file_name == ".DS_Store"
        || file_name.starts_with("._")
        || file_name == "Thumbs.db"
}
