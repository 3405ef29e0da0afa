//! Batch files
//!
//! A batch is a list of actions in JSON (a top-level array) or TOML
//! (`[[actions]]` tables). Each entry is tagged by `kind`:
//!
//! ```toml
//! [[actions]]
//! kind = "upsert_markdown_file"
//! path = "notes/today.md"
//! content = "# Today\n"
//!
//! [[actions]]
//! kind = "process_markdown_file"
//! path = "notes/today.md"
//! transform = { append = "- buy milk\n" }
//! ```

use anyhow::{Context, Result};
use quire_core::{NodeKind, PathError, SplitPath, Transform, VaultAction};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One action as written in a batch file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    CreateFolder {
        path: String,
    },
    TrashFolder {
        path: String,
    },
    RenameFolder {
        from: String,
        to: String,
    },
    CreateFile {
        path: String,
        #[serde(default)]
        content: Option<String>,
    },
    TrashFile {
        path: String,
    },
    RenameFile {
        from: String,
        to: String,
    },
    RenameMarkdownFile {
        from: String,
        to: String,
    },
    UpsertMarkdownFile {
        path: String,
        #[serde(default)]
        content: Option<String>,
    },
    ProcessMarkdownFile {
        path: String,
        transform: TransformSpec,
    },
}

/// Declarative content transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformSpec {
    /// Add text at the end
    Append(String),
    /// Add text at the start
    Prepend(String),
    /// Replace every occurrence of `from` with `to`
    Replace { from: String, to: String },
    /// Replace line `line` (1-based), padding with empty lines if short
    SetLine { line: usize, text: String },
}

#[derive(Debug, Deserialize)]
struct TomlBatch {
    #[serde(default)]
    actions: Vec<ActionSpec>,
}

impl TransformSpec {
    pub fn into_transform(self) -> Result<Transform> {
        let transform = match self {
            TransformSpec::Append(text) => Transform::new(move |c| c + &text),
            TransformSpec::Prepend(text) => Transform::new(move |c| format!("{}{}", text, c)),
            TransformSpec::Replace { from, to } => {
                if from.is_empty() {
                    anyhow::bail!("replace transform needs a non-empty 'from'");
                }
                Transform::new(move |c| c.replace(&from, &to))
            }
            TransformSpec::SetLine { line, text } => {
                if line == 0 {
                    anyhow::bail!("set_line transform lines are 1-based");
                }
                Transform::new(move |c| set_line(&c, line, &text))
            }
        };
        Ok(transform)
    }
}

fn set_line(content: &str, line: usize, text: &str) -> String {
    let trailing_newline = content.ends_with('\n');
    let mut lines: Vec<&str> = content.lines().collect();
    while lines.len() < line {
        lines.push("");
    }
    lines[line - 1] = text;

    let mut out = lines.join("\n");
    if trailing_newline || content.is_empty() {
        out.push('\n');
    }
    out
}

type PathParser = fn(&str) -> std::result::Result<SplitPath, PathError>;

fn parse(kind: &str, path: &str, parser: PathParser) -> Result<SplitPath> {
    parser(path).with_context(|| format!("Invalid {} path '{}'", kind, path))
}

fn folder(path: &str) -> Result<SplitPath> {
    parse("folder", path, SplitPath::folder)
}

fn markdown(path: &str) -> Result<SplitPath> {
    parse("markdown", path, SplitPath::markdown)
}

/// Markdown when the path says so, plain file otherwise
fn any_file(path: &str) -> Result<SplitPath> {
    let target = parse("file", path, SplitPath::infer)?;
    Ok(match target.kind {
        NodeKind::Folder => target.with_kind(NodeKind::File),
        NodeKind::File | NodeKind::MdFile => target,
    })
}

impl ActionSpec {
    /// Resolve paths and transforms into a dispatchable action
    pub fn into_action(self) -> Result<VaultAction> {
        let action = match self {
            ActionSpec::CreateFolder { path } => VaultAction::CreateFolder {
                target: folder(&path)?,
            },
            ActionSpec::TrashFolder { path } => VaultAction::TrashFolder {
                target: folder(&path)?,
            },
            ActionSpec::RenameFolder { from, to } => VaultAction::RenameFolder {
                from: folder(&from)?,
                to: folder(&to)?,
            },
            ActionSpec::CreateFile { path, content } => VaultAction::CreateFile {
                target: any_file(&path)?,
                content,
            },
            ActionSpec::TrashFile { path } => VaultAction::TrashFile {
                target: any_file(&path)?,
            },
            ActionSpec::RenameFile { from, to } => VaultAction::RenameFile {
                from: any_file(&from)?,
                to: any_file(&to)?,
            },
            ActionSpec::RenameMarkdownFile { from, to } => VaultAction::RenameMarkdownFile {
                from: markdown(&from)?,
                to: markdown(&to)?,
            },
            ActionSpec::UpsertMarkdownFile { path, content } => VaultAction::UpsertMarkdownFile {
                target: markdown(&path)?,
                content,
            },
            ActionSpec::ProcessMarkdownFile { path, transform } => {
                VaultAction::ProcessMarkdownFile {
                    target: markdown(&path)?,
                    transform: transform.into_transform()?,
                }
            }
        };
        Ok(action)
    }
}

/// Parse a JSON batch (top-level array)
pub fn parse_json(contents: &str) -> Result<Vec<VaultAction>> {
    let specs: Vec<ActionSpec> = serde_json::from_str(contents).context("Invalid JSON batch")?;
    into_actions(specs)
}

/// Parse a TOML batch (`[[actions]]` tables)
pub fn parse_toml(contents: &str) -> Result<Vec<VaultAction>> {
    let batch: TomlBatch = toml::from_str(contents).context("Invalid TOML batch")?;
    into_actions(batch.actions)
}

fn into_actions(specs: Vec<ActionSpec>) -> Result<Vec<VaultAction>> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| spec.into_action().with_context(|| format!("Action #{}", i + 1)))
        .collect()
}

/// Load a batch file, picking the format from its extension
pub fn load(path: &Path) -> Result<Vec<VaultAction>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => parse_json(&contents),
        Some("toml") => parse_toml(&contents),
        _ => anyhow::bail!(
            "Unsupported batch format: {} (expected .json or .toml)",
            path.display()
        ),
    }
}
