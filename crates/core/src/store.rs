//! The hierarchical store the dispatcher executes against

use crate::event::VaultEvent;
use crate::path::SplitPath;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the change-notification channel stores expose
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Failure of a single store primitive
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not a folder: {0}")]
    NotAFolder(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("watch error: {0}")]
    Watch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Mutable hierarchical store of folders, files and markdown documents
///
/// Creating a node whose ancestors are missing creates those folders one
/// level at a time, each raising its own `Created` notification.
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Whether a node exists at `path` (any kind)
    async fn exists(&self, path: &SplitPath) -> StoreResult<bool>;

    /// Create a folder; succeeds if it already exists
    async fn create_folder(&self, path: &SplitPath) -> StoreResult<()>;

    /// Create a file; fails with `AlreadyExists` if the path is taken
    async fn create_file(&self, path: &SplitPath, content: &str) -> StoreResult<()>;

    /// Read a file's content
    async fn read(&self, path: &SplitPath) -> StoreResult<String>;

    /// Overwrite an existing file's content
    async fn write(&self, path: &SplitPath, content: &str) -> StoreResult<()>;

    /// Move `from` to `to`, creating missing destination parents
    async fn rename(&self, from: &SplitPath, to: &SplitPath) -> StoreResult<()>;

    /// Trash a node (and its subtree)
    async fn trash(&self, path: &SplitPath) -> StoreResult<()>;

    /// Subscribe to the raw change-notification stream
    fn subscribe(&self) -> broadcast::Receiver<VaultEvent>;
}
