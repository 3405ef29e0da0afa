//! Declarative vault mutations and their identity keys

use crate::path::{NodeKind, SplitPath};
use crate::transform::Transform;
use std::fmt;

/// A single declarative mutation request against the vault
///
/// Producers emit these freely (duplicates, redundant writes, re-processing);
/// the dispatcher collapses a batch before anything touches the store.
#[derive(Debug, Clone)]
pub enum VaultAction {
    /// Create a folder (and any missing ancestors)
    CreateFolder { target: SplitPath },
    /// Move a folder and its contents to the trash
    TrashFolder { target: SplitPath },
    /// Move or rename a folder
    RenameFolder { from: SplitPath, to: SplitPath },
    /// Create a plain file, optionally with content
    CreateFile {
        target: SplitPath,
        content: Option<String>,
    },
    /// Move a file (plain or markdown) to the trash
    TrashFile { target: SplitPath },
    /// Move or rename a plain file
    RenameFile { from: SplitPath, to: SplitPath },
    /// Move or rename a markdown file
    RenameMarkdownFile { from: SplitPath, to: SplitPath },
    /// Create or overwrite a markdown file
    ///
    /// `None` means "make sure it exists" without touching existing content.
    UpsertMarkdownFile {
        target: SplitPath,
        content: Option<String>,
    },
    /// Rewrite a markdown file's content through `transform`
    ProcessMarkdownFile {
        target: SplitPath,
        transform: Transform,
    },
}

/// Fieldless discriminant of [`VaultAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateFolder,
    TrashFolder,
    RenameFolder,
    CreateFile,
    TrashFile,
    RenameFile,
    RenameMarkdownFile,
    UpsertMarkdownFile,
    ProcessMarkdownFile,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::CreateFolder => "CreateFolder",
            ActionKind::TrashFolder => "TrashFolder",
            ActionKind::RenameFolder => "RenameFolder",
            ActionKind::CreateFile => "CreateFile",
            ActionKind::TrashFile => "TrashFile",
            ActionKind::RenameFile => "RenameFile",
            ActionKind::RenameMarkdownFile => "RenameMarkdownFile",
            ActionKind::UpsertMarkdownFile => "UpsertMarkdownFile",
            ActionKind::ProcessMarkdownFile => "ProcessMarkdownFile",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping key: node kind plus the path the action happens *to*
///
/// Renames key on their source, everything else on its target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKey {
    pub kind: NodeKind,
    pub path: String,
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.tag(), self.path)
    }
}

impl VaultAction {
    /// `CreateFolder` for `target`
    pub fn create_folder(target: SplitPath) -> Self {
        VaultAction::CreateFolder { target }
    }

    /// `UpsertMarkdownFile` with final content
    pub fn upsert(target: SplitPath, content: impl Into<String>) -> Self {
        VaultAction::UpsertMarkdownFile {
            target,
            content: Some(content.into()),
        }
    }

    /// `ProcessMarkdownFile` with a synchronous transform
    pub fn process<F>(target: SplitPath, f: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        VaultAction::ProcessMarkdownFile {
            target,
            transform: Transform::new(f),
        }
    }

    /// Trash for `target`, folder or file depending on its kind
    pub fn trash(target: SplitPath) -> Self {
        match target.kind {
            NodeKind::Folder => VaultAction::TrashFolder { target },
            NodeKind::File | NodeKind::MdFile => VaultAction::TrashFile { target },
        }
    }

    /// Rename for `from`, folder/file/markdown depending on its kind
    pub fn rename(from: SplitPath, to: SplitPath) -> Self {
        match from.kind {
            NodeKind::Folder => VaultAction::RenameFolder { from, to },
            NodeKind::File => VaultAction::RenameFile { from, to },
            NodeKind::MdFile => VaultAction::RenameMarkdownFile { from, to },
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            VaultAction::CreateFolder { .. } => ActionKind::CreateFolder,
            VaultAction::TrashFolder { .. } => ActionKind::TrashFolder,
            VaultAction::RenameFolder { .. } => ActionKind::RenameFolder,
            VaultAction::CreateFile { .. } => ActionKind::CreateFile,
            VaultAction::TrashFile { .. } => ActionKind::TrashFile,
            VaultAction::RenameFile { .. } => ActionKind::RenameFile,
            VaultAction::RenameMarkdownFile { .. } => ActionKind::RenameMarkdownFile,
            VaultAction::UpsertMarkdownFile { .. } => ActionKind::UpsertMarkdownFile,
            VaultAction::ProcessMarkdownFile { .. } => ActionKind::ProcessMarkdownFile,
        }
    }

    /// The node this action happens to (the source for renames)
    pub fn source(&self) -> &SplitPath {
        match self {
            VaultAction::CreateFolder { target }
            | VaultAction::TrashFolder { target }
            | VaultAction::CreateFile { target, .. }
            | VaultAction::TrashFile { target }
            | VaultAction::UpsertMarkdownFile { target, .. }
            | VaultAction::ProcessMarkdownFile { target, .. } => target,
            VaultAction::RenameFolder { from, .. }
            | VaultAction::RenameFile { from, .. }
            | VaultAction::RenameMarkdownFile { from, .. } => from,
        }
    }

    /// Where the node ends up (the destination for renames)
    pub fn destination(&self) -> &SplitPath {
        match self {
            VaultAction::CreateFolder { target }
            | VaultAction::TrashFolder { target }
            | VaultAction::CreateFile { target, .. }
            | VaultAction::TrashFile { target }
            | VaultAction::UpsertMarkdownFile { target, .. }
            | VaultAction::ProcessMarkdownFile { target, .. } => target,
            VaultAction::RenameFolder { to, .. }
            | VaultAction::RenameFile { to, .. }
            | VaultAction::RenameMarkdownFile { to, .. } => to,
        }
    }

    /// Identity key used for collapsing and graph nodes
    pub fn key(&self) -> ActionKey {
        let source = self.source();
        ActionKey {
            kind: source.kind,
            path: source.to_system_path(),
        }
    }

    /// Depth used as the sort tie-break (destination for renames)
    pub fn depth(&self) -> usize {
        self.destination().depth()
    }

    pub fn is_trash(&self) -> bool {
        matches!(
            self,
            VaultAction::TrashFolder { .. } | VaultAction::TrashFile { .. }
        )
    }

    pub fn is_rename(&self) -> bool {
        matches!(
            self,
            VaultAction::RenameFolder { .. }
                | VaultAction::RenameFile { .. }
                | VaultAction::RenameMarkdownFile { .. }
        )
    }

    /// Whether executing this action can bring a node into existence
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            VaultAction::CreateFolder { .. }
                | VaultAction::CreateFile { .. }
                | VaultAction::UpsertMarkdownFile { .. }
                | VaultAction::ProcessMarkdownFile { .. }
        )
    }
}

impl fmt::Display for VaultAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VaultAction::RenameFolder { from, to }
            | VaultAction::RenameFile { from, to }
            | VaultAction::RenameMarkdownFile { from, to } => {
                write!(f, "{}({} -> {})", self.kind(), from, to)
            }
            _ => write!(f, "{}({})", self.kind(), self.source()),
        }
    }
}
