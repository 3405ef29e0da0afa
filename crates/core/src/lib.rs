//! Quire Core - data model shared by the dispatch pipeline
//!
//! This crate provides:
//! - Split vault paths and path normalization
//! - The closed set of vault actions and their identity keys
//! - Content transforms for markdown processing
//! - The store collaborator trait and its change notifications
//! - An in-memory store

pub mod action;
pub mod event;
pub mod memory;
pub mod path;
pub mod store;
pub mod transform;

// Re-export main types for convenience
pub use action::{ActionKey, ActionKind, VaultAction};
pub use event::{EventKind, VaultEvent};
pub use memory::MemoryStore;
pub use path::{normalize_path, NodeKind, PathError, SplitPath};
pub use store::{StoreError, StoreResult, VaultStore};
pub use transform::Transform;
