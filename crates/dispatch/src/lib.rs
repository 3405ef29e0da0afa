//! Action dispatch pipeline for Quire vaults
//!
//! This crate provides:
//! - Collapsing of redundant action batches (one action per identity key)
//! - Dependency graph construction from path containment
//! - Topological ordering with depth tie-breaks
//! - Idempotent execution of single actions against a store
//! - The `Dispatcher`, which ties the stages together and suppresses the
//!   store notifications its own execution causes

pub mod collapse;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod graph;
pub mod sort;

// Re-exports
pub use collapse::collapse;
pub use dispatcher::{plan, DispatchReport, Dispatcher, DispatcherConfig};
pub use error::{ActionFailure, DispatchError, Result};
pub use executor::{execute, Outcome};
pub use graph::{DependencyGraph, GraphNode};
pub use sort::topological_sort;
