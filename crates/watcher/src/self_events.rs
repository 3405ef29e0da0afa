//! Self-event tracking
//!
//! Before a batch executes, every path it is expected to raise a
//! notification for is registered here. When the store's notification for
//! one of those paths arrives, the registration is popped and the
//! notification is swallowed, so the dispatcher never hears its own echo.
//! Registrations for actions that end up raising nothing (no-ops and
//! failures) are released by the dispatcher right after they run.

use crate::expiring::ExpiringRegistry;
use ahash::AHashSet;
use quire_core::{normalize_path, EventKind, SplitPath, VaultAction, VaultEvent, VaultStore};
use std::time::Duration;
use tracing::trace;

/// Default lifetime of a registration
pub const DEFAULT_SELF_EVENT_TTL: Duration = Duration::from_secs(5);

/// Pop-on-match registry of paths this process is about to touch
pub struct SelfEventTracker {
    registry: ExpiringRegistry<String>,
}

impl SelfEventTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            registry: ExpiringRegistry::new(ttl),
        }
    }

    /// Register every path `actions` will cause notifications for
    ///
    /// `store` is consulted for ancestor folders; those that already exist
    /// raise no notification and are not registered. Returns the registered
    /// paths grouped by action, parallel to `actions`.
    pub async fn register<S>(&self, actions: &[VaultAction], store: &S) -> Vec<Vec<String>>
    where
        S: VaultStore + ?Sized,
    {
        let per_action = expected_paths_by_action(actions, store).await;
        for path in per_action.iter().flatten() {
            trace!("registering self event: {}", path);
            self.registry.register(path.clone());
        }
        per_action
    }

    /// Drop registrations whose notification will never come
    ///
    /// Returns how many of `paths` were still registered.
    pub fn release(&self, paths: &[String]) -> usize {
        paths
            .iter()
            .filter(|path| {
                let released = self.registry.consume(&normalize_path(path));
                if released {
                    trace!("releasing self event: {}", path);
                }
                released
            })
            .count()
    }

    /// Whether a notification for `path` was caused by us
    ///
    /// A hit consumes the registration: each registration suppresses
    /// exactly one notification.
    pub fn should_ignore(&self, path: &str) -> bool {
        let key = normalize_path(path);
        let hit = self.registry.consume(&key);
        if hit {
            trace!("suppressing self event: {}", key);
        }
        hit
    }

    /// Event-level check; renames consume both endpoints
    pub fn should_ignore_event(&self, event: &VaultEvent) -> bool {
        match event.kind {
            EventKind::Renamed => {
                let to = event.to_path.as_deref().unwrap_or(&event.path);
                let to_hit = self.should_ignore(to);
                let from_hit = event
                    .from_path
                    .as_deref()
                    .map(|from| self.should_ignore(from))
                    .unwrap_or(false);
                to_hit || from_hit
            }
            EventKind::Created | EventKind::Modified | EventKind::Deleted => {
                self.should_ignore(&event.path)
            }
        }
    }

    /// Whether `path` is currently registered (does not consume)
    pub fn is_tracked(&self, path: &str) -> bool {
        self.registry.contains(&normalize_path(path))
    }

    /// Number of outstanding registrations
    pub fn tracked_count(&self) -> usize {
        self.registry.len()
    }

    pub fn ttl(&self) -> Duration {
        self.registry.ttl()
    }

    /// Drop all registrations and cancel their timers
    pub fn clear(&self) {
        self.registry.clear();
    }
}

impl Default for SelfEventTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_EVENT_TTL)
    }
}

/// Paths a batch is expected to raise notifications for, in execution order
///
/// Creations cover their target plus every ancestor folder that neither
/// exists in the store nor is created earlier in the batch. Renames cover
/// both endpoints, each with its own missing ancestors. Trashes cover only
/// their target.
pub async fn expected_paths<S>(actions: &[VaultAction], store: &S) -> Vec<String>
where
    S: VaultStore + ?Sized,
{
    expected_paths_by_action(actions, store)
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// [`expected_paths`], grouped by the action that causes each path
///
/// A path expected from several actions is listed under the first.
pub async fn expected_paths_by_action<S>(actions: &[VaultAction], store: &S) -> Vec<Vec<String>>
where
    S: VaultStore + ?Sized,
{
    let mut plan = PathPlan::default();

    for action in actions {
        plan.paths.push(Vec::new());
        match action {
            VaultAction::CreateFolder { target } => {
                plan.push_missing_ancestors(target, store).await;
                plan.push(target.to_system_path());
                plan.known.insert(target.to_system_path());
            }
            VaultAction::CreateFile { target, .. }
            | VaultAction::UpsertMarkdownFile { target, .. }
            | VaultAction::ProcessMarkdownFile { target, .. } => {
                plan.push_missing_ancestors(target, store).await;
                plan.push(target.to_system_path());
            }
            VaultAction::RenameFolder { from, to } => {
                plan.push_missing_ancestors(from, store).await;
                plan.push(from.to_system_path());
                plan.push_missing_ancestors(to, store).await;
                plan.push(to.to_system_path());
                plan.known.insert(to.to_system_path());
            }
            VaultAction::RenameFile { from, to } | VaultAction::RenameMarkdownFile { from, to } => {
                plan.push_missing_ancestors(from, store).await;
                plan.push(from.to_system_path());
                plan.push_missing_ancestors(to, store).await;
                plan.push(to.to_system_path());
            }
            VaultAction::TrashFolder { target } | VaultAction::TrashFile { target } => {
                plan.push(target.to_system_path());
            }
        }
    }

    plan.paths
}

#[derive(Default)]
struct PathPlan {
    /// One group per action seen so far
    paths: Vec<Vec<String>>,
    seen: AHashSet<String>,
    /// Folders known to exist (in the store or created earlier in the batch)
    known: AHashSet<String>,
}

impl PathPlan {
    fn push(&mut self, path: String) {
        if self.seen.insert(path.clone()) {
            if let Some(group) = self.paths.last_mut() {
                group.push(path);
            }
        }
    }

    async fn push_missing_ancestors<S>(&mut self, path: &SplitPath, store: &S)
    where
        S: VaultStore + ?Sized,
    {
        for ancestor in path.ancestors() {
            let key = ancestor.to_system_path();
            if self.known.contains(&key) {
                continue;
            }
            // A failed existence check counts as missing; an extra
            // registration only expires unused
            if !store.exists(&ancestor).await.unwrap_or(false) {
                self.push(key.clone());
            }
            self.known.insert(key);
        }
    }
}
