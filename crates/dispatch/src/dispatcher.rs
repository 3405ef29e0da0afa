//! Batch dispatch
//!
//! `dispatch` runs a batch through collapse, dependency graph and
//! topological sort, registers the paths it is about to touch with the
//! self-event tracker, then executes the sorted actions one at a time.
//! An action that turns out to be a no-op, or fails, releases the
//! registrations it will never echo. A failing action is recorded and the
//! batch moves on; nothing is rolled back.
//!
//! Separate `dispatch` calls are not serialized against each other.

use crate::collapse::collapse;
use crate::error::{ActionFailure, DispatchError, Result};
use crate::executor::{execute, Outcome};
use crate::graph::DependencyGraph;
use crate::sort::topological_sort;
use quire_core::{SplitPath, VaultAction, VaultEvent, VaultStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use watcher::{EventFilter, SelfEventTracker, DEFAULT_SELF_EVENT_TTL};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How long a self-event registration waits for its echo
    pub self_event_ttl: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            self_event_ttl: DEFAULT_SELF_EVENT_TTL,
        }
    }
}

/// Outcome of a fully successful batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Actions submitted by the caller
    pub submitted: usize,
    /// Actions executed after collapsing
    pub executed: usize,
}

/// Collapse, graph and sort `actions` without touching any store
pub async fn plan(actions: Vec<VaultAction>) -> Result<Vec<VaultAction>> {
    let collapsed = collapse(actions).await;
    let graph = DependencyGraph::build(collapsed);
    debug!("dependency graph: {} nodes, {} edges", graph.len(), graph.edge_count());
    topological_sort(graph)
}

/// Front door for mutating a vault store
pub struct Dispatcher<S: VaultStore + ?Sized> {
    store: Arc<S>,
    tracker: Arc<SelfEventTracker>,
    filter: EventFilter,
}

impl<S: VaultStore + ?Sized + 'static> Dispatcher<S> {
    /// Create a dispatcher over `store`
    ///
    /// Spawns the notification filter onto the current tokio runtime.
    pub fn new(store: Arc<S>, config: DispatcherConfig) -> Self {
        let tracker = Arc::new(SelfEventTracker::new(config.self_event_ttl));
        let filter = EventFilter::spawn(store.subscribe(), tracker.clone());
        Self {
            store,
            tracker,
            filter,
        }
    }

    /// Apply `actions` to the store
    ///
    /// Only a dependency cycle aborts before execution. Otherwise every
    /// sorted action runs and failures come back as
    /// [`DispatchError::Partial`], with the successful actions applied.
    pub async fn dispatch(&self, actions: Vec<VaultAction>) -> Result<DispatchReport> {
        let submitted = actions.len();
        let sorted = plan(actions).await?;

        let registered = self.tracker.register(&sorted, self.store.as_ref()).await;
        debug!(
            "registered {} self-event paths",
            registered.iter().map(Vec::len).sum::<usize>()
        );

        let mut failures = Vec::new();
        for (action, paths) in sorted.iter().zip(&registered) {
            match execute(self.store.as_ref(), action).await {
                Ok(Outcome::Applied) => {}
                Ok(Outcome::Unchanged) => {
                    self.tracker.release(paths);
                }
                Err(e) => {
                    warn!("{} failed: {}", action, e);
                    self.release_unapplied(action, paths).await;
                    failures.push(ActionFailure {
                        action: action.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let executed = sorted.len() - failures.len();
        info!(
            "dispatched {} actions ({} after collapse, {} failed)",
            submitted,
            sorted.len(),
            failures.len()
        );

        if failures.is_empty() {
            Ok(DispatchReport {
                submitted,
                executed,
            })
        } else {
            Err(DispatchError::Partial(failures))
        }
    }

    /// Execution order `dispatch` would use, without executing
    pub async fn plan(&self, actions: Vec<VaultAction>) -> Result<Vec<VaultAction>> {
        plan(actions).await
    }

    /// External (non-self) change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.filter.subscribe()
    }

    pub fn tracker(&self) -> &SelfEventTracker {
        &self.tracker
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Release what a failed action registered and did not create
    ///
    /// The action's own endpoints are released outright. Ancestor folders
    /// it created before failing stay registered, since their echoes are
    /// on the way.
    async fn release_unapplied(&self, action: &VaultAction, paths: &[String]) {
        let endpoints = [
            action.source().to_system_path(),
            action.destination().to_system_path(),
        ];

        let mut unused = Vec::with_capacity(paths.len());
        for path in paths {
            let created = if endpoints.contains(path) {
                false
            } else {
                match SplitPath::folder(path) {
                    Ok(folder) => self.store.exists(&folder).await.unwrap_or(false),
                    Err(_) => false,
                }
            };
            if !created {
                unused.push(path.clone());
            }
        }

        let released = self.tracker.release(&unused);
        debug!("released {} registrations of failed {}", released, action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{MemoryStore, SplitPath};

    fn md(path: &str) -> SplitPath {
        SplitPath::markdown(path).unwrap()
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let store = Arc::new(MemoryStore::new());
        store.create_file(&md("a.md"), "").await.unwrap();
        store.create_file(&md("b.md"), "").await.unwrap();
        let dispatcher = Dispatcher::new(store.clone(), DispatcherConfig::default());

        let result = dispatcher
            .dispatch(vec![
                VaultAction::rename(md("a.md"), md("b.md")),
                VaultAction::upsert(md("c.md"), "ok"),
            ])
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].action.to_string(), "RenameMarkdownFile(a.md -> b.md)");
        assert!(err.failures()[0].error.contains("already exists"));
        assert_eq!(store.file_content("c.md").as_deref(), Some("ok"));
        // Only the successful upsert's echo was pending
        assert!(!dispatcher.tracker().is_tracked("a.md"));
        assert!(!dispatcher.tracker().is_tracked("b.md"));
    }

    #[tokio::test]
    async fn test_report_counts() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store, DispatcherConfig::default());

        let report = dispatcher
            .dispatch(vec![
                VaultAction::upsert(md("a.md"), "1"),
                VaultAction::upsert(md("a.md"), "2"),
                VaultAction::upsert(md("b.md"), "1"),
            ])
            .await
            .unwrap();

        assert_eq!(
            report,
            DispatchReport {
                submitted: 3,
                executed: 2
            }
        );
    }

    #[tokio::test]
    async fn test_plan_does_not_register() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store.clone(), DispatcherConfig::default());

        let order = dispatcher
            .plan(vec![VaultAction::upsert(md("x/y.md"), "")])
            .await
            .unwrap();

        assert_eq!(order.len(), 1);
        assert_eq!(dispatcher.tracker().tracked_count(), 0);
        assert!(store.paths().is_empty());
    }
}
