//! Change tracking for Quire vaults
//!
//! This crate provides:
//! - A TTL-expiring key registry with per-entry timers
//! - The self-event tracker that recognizes the dispatcher's own echoes
//! - A background filter forwarding only external notifications
//! - Ignore rules (built-ins, `.quireignore`, config patterns)
//! - A directory-backed store fed by the platform watcher

pub mod expiring;
pub mod filter;
pub mod fs_store;
pub mod ignore;
pub mod self_events;

pub use expiring::ExpiringRegistry;
pub use filter::EventFilter;
pub use fs_store::{FsStore, FsStoreOptions, TrashMode, TRASH_DIR};
pub use ignore::{IgnoreConfig, IgnoreRules};
pub use self_events::{
    expected_paths, expected_paths_by_action, SelfEventTracker, DEFAULT_SELF_EVENT_TTL,
};
