//! Vault-relative paths split into a folder chain, a basename and a node kind
//!
//! Every node in a vault is addressed by `(path_parts, basename[, extension])`.
//! The string form used for store lookups and change notifications is the
//! normalized, `/`-separated join of those pieces (see [`normalize_path`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Extension carried by markdown documents
pub const MARKDOWN_EXTENSION: &str = "md";

/// Kind of node a path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Folder
    Folder,
    /// Plain (non-markdown) file
    File,
    /// Markdown document
    MdFile,
}

impl NodeKind {
    /// Short tag used in identity keys and logs
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::File => "file",
            NodeKind::MdFile => "md",
        }
    }
}

/// Rejected path input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path segment '{segment}' is not allowed in '{path}'")]
    ForbiddenSegment { path: String, segment: String },

    #[error("'{0}' is not a markdown file")]
    NotMarkdown(String),
}

/// A vault path split into its folder chain, basename and optional extension
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SplitPath {
    /// Folder segments from the vault root down to the parent of this node
    pub path_parts: Vec<String>,
    /// Last segment without its extension
    pub basename: String,
    /// Extension (files only)
    pub extension: Option<String>,
    /// What the path points at
    pub kind: NodeKind,
}

impl SplitPath {
    /// Parse a folder path such as `notes/daily`
    pub fn folder(path: &str) -> Result<Self, PathError> {
        let (path_parts, basename) = split_segments(path)?;
        Ok(Self {
            path_parts,
            basename,
            extension: None,
            kind: NodeKind::Folder,
        })
    }

    /// Parse a plain file path such as `assets/logo.png`
    pub fn file(path: &str) -> Result<Self, PathError> {
        let (path_parts, last) = split_segments(path)?;
        let (basename, extension) = split_extension(&last);
        Ok(Self {
            path_parts,
            basename,
            extension,
            kind: NodeKind::File,
        })
    }

    /// Parse a markdown path such as `notes/daily/today.md`
    pub fn markdown(path: &str) -> Result<Self, PathError> {
        let (path_parts, last) = split_segments(path)?;
        let (basename, extension) = split_extension(&last);
        if extension.as_deref() != Some(MARKDOWN_EXTENSION) {
            return Err(PathError::NotMarkdown(normalize_path(path)));
        }
        Ok(Self {
            path_parts,
            basename,
            extension,
            kind: NodeKind::MdFile,
        })
    }

    /// Parse a path, inferring the kind: `.md` is markdown, any other
    /// extension is a plain file, no extension is a folder
    pub fn infer(path: &str) -> Result<Self, PathError> {
        let (_, last) = split_segments(path)?;
        match split_extension(&last).1.as_deref() {
            Some(MARKDOWN_EXTENSION) => Self::markdown(path),
            Some(_) => Self::file(path),
            None => Self::folder(path),
        }
    }

    /// Normalized `/`-separated path as the store sees it
    pub fn to_system_path(&self) -> String {
        let mut out = String::new();
        for part in &self.path_parts {
            out.push_str(part);
            out.push('/');
        }
        out.push_str(&self.basename);
        if let Some(ext) = &self.extension {
            out.push('.');
            out.push_str(ext);
        }
        out
    }

    /// Last segment including the extension
    pub fn file_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{}", self.basename, ext),
            None => self.basename.clone(),
        }
    }

    /// Number of path segments, the node itself included
    pub fn depth(&self) -> usize {
        self.path_parts.len() + 1
    }

    /// Containing folder, `None` for nodes at the vault root
    pub fn parent(&self) -> Option<SplitPath> {
        let (basename, rest) = self.path_parts.split_last()?;
        Some(SplitPath {
            path_parts: rest.to_vec(),
            basename: basename.clone(),
            extension: None,
            kind: NodeKind::Folder,
        })
    }

    /// Every proper ancestor folder, shallowest first
    pub fn ancestors(&self) -> Vec<SplitPath> {
        (0..self.path_parts.len())
            .map(|i| SplitPath {
                path_parts: self.path_parts[..i].to_vec(),
                basename: self.path_parts[i].clone(),
                extension: None,
                kind: NodeKind::Folder,
            })
            .collect()
    }

    /// System paths of every proper ancestor folder, shallowest first
    pub fn ancestor_paths(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.path_parts.len());
        let mut current = String::new();
        for part in &self.path_parts {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            out.push(current.clone());
        }
        out
    }

    /// Whether `self` is a folder strictly above `other`
    pub fn is_ancestor_of(&self, other: &SplitPath) -> bool {
        if self.kind != NodeKind::Folder || other.path_parts.len() <= self.path_parts.len() {
            return false;
        }
        other.path_parts[..self.path_parts.len()] == self.path_parts[..]
            && other.path_parts[self.path_parts.len()] == self.basename
    }

    /// Same location with a different kind
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for SplitPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_system_path())
    }
}

/// Normalize a path string the way change notifications are matched
///
/// - Unifies `\` into `/`
/// - Trims leading and trailing separators
/// - Drops empty segments produced by repeated separators
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn split_segments(path: &str) -> Result<(Vec<String>, String), PathError> {
    let normalized = normalize_path(path);
    if normalized.is_empty() {
        return Err(PathError::Empty);
    }

    let mut segments: Vec<String> = Vec::new();
    for segment in normalized.split('/') {
        if segment == "." || segment == ".." {
            return Err(PathError::ForbiddenSegment {
                path: normalized.clone(),
                segment: segment.to_string(),
            });
        }
        segments.push(segment.to_string());
    }

    // normalized is non-empty, so there is at least one segment
    let basename = segments.pop().unwrap_or_default();
    Ok((segments, basename))
}

fn split_extension(name: &str) -> (String, Option<String>) {
    match name.rfind('.') {
        // Dotfiles like `.env` have no extension
        Some(0) | None => (name.to_string(), None),
        Some(idx) if idx + 1 == name.len() => (name.to_string(), None),
        Some(idx) => (name[..idx].to_string(), Some(name[idx + 1..].to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a/b/"), "a/b");
        assert_eq!(normalize_path("a\\b\\c.md"), "a/b/c.md");
        assert_eq!(normalize_path("//a//b"), "a/b");
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn test_markdown_round_trip() {
        let path = SplitPath::markdown("root/parent/child/file.md").unwrap();
        assert_eq!(path.path_parts, vec!["root", "parent", "child"]);
        assert_eq!(path.basename, "file");
        assert_eq!(path.extension.as_deref(), Some("md"));
        assert_eq!(path.kind, NodeKind::MdFile);
        assert_eq!(path.to_system_path(), "root/parent/child/file.md");
        assert_eq!(path.depth(), 4);
    }

    #[test]
    fn test_markdown_rejects_other_extensions() {
        assert_eq!(
            SplitPath::markdown("a/b.txt"),
            Err(PathError::NotMarkdown("a/b.txt".to_string()))
        );
    }

    #[test]
    fn test_rejects_empty_and_parent_segments() {
        assert_eq!(SplitPath::folder("/"), Err(PathError::Empty));
        assert!(matches!(
            SplitPath::file("a/../b.txt"),
            Err(PathError::ForbiddenSegment { .. })
        ));
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        let path = SplitPath::file(".env").unwrap();
        assert_eq!(path.basename, ".env");
        assert_eq!(path.extension, None);
        assert_eq!(path.to_system_path(), ".env");
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(SplitPath::infer("a/b").unwrap().kind, NodeKind::Folder);
        assert_eq!(SplitPath::infer("a/b.png").unwrap().kind, NodeKind::File);
        assert_eq!(SplitPath::infer("a/b.md").unwrap().kind, NodeKind::MdFile);
    }

    #[test]
    fn test_ancestors_are_shallowest_first() {
        let path = SplitPath::markdown("a/b/c/d.md").unwrap();
        assert_eq!(path.ancestor_paths(), vec!["a", "a/b", "a/b/c"]);

        let ancestors = path.ancestors();
        assert_eq!(ancestors.len(), 3);
        assert!(ancestors.iter().all(|a| a.kind == NodeKind::Folder));
        assert_eq!(ancestors[2].to_system_path(), "a/b/c");
        assert_eq!(path.parent().unwrap(), ancestors[2]);
    }

    #[test]
    fn test_is_ancestor_of() {
        let a = SplitPath::folder("a").unwrap();
        let ab = SplitPath::folder("a/b").unwrap();
        let file = SplitPath::markdown("a/b/c.md").unwrap();
        let sibling = SplitPath::folder("ab").unwrap();

        assert!(a.is_ancestor_of(&ab));
        assert!(a.is_ancestor_of(&file));
        assert!(ab.is_ancestor_of(&file));
        assert!(!ab.is_ancestor_of(&ab));
        assert!(!ab.is_ancestor_of(&a));
        assert!(!sibling.is_ancestor_of(&ab));
        assert!(!file.is_ancestor_of(&ab));
    }
}
