//! Forwarding of external notifications
//!
//! Consumes a store's raw notification stream, drops everything the
//! [`SelfEventTracker`] recognizes as our own echo and re-broadcasts the
//! rest, unchanged, to external subscribers.

use crate::self_events::SelfEventTracker;
use quire_core::store::EVENT_CHANNEL_CAPACITY;
use quire_core::VaultEvent;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Background task filtering self-caused notifications
pub struct EventFilter {
    outbound: broadcast::Sender<VaultEvent>,
    task: JoinHandle<()>,
}

impl EventFilter {
    /// Spawn the filter onto the current tokio runtime
    pub fn spawn(mut raw: broadcast::Receiver<VaultEvent>, tracker: Arc<SelfEventTracker>) -> Self {
        let (outbound, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let tx = outbound.clone();

        let task = tokio::spawn(async move {
            loop {
                match raw.recv().await {
                    Ok(event) => {
                        if tracker.should_ignore_event(&event) {
                            trace!("dropped self event: {}", event);
                            continue;
                        }
                        debug!("external event: {}", event);
                        // No subscribers is fine
                        let _ = tx.send(event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Event filter lagged, {} notifications dropped", skipped);
                    }
                    Err(RecvError::Closed) => {
                        debug!("store notification stream closed");
                        break;
                    }
                }
            }
        });

        Self { outbound, task }
    }

    /// Subscribe to external notifications
    pub fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.outbound.subscribe()
    }

    /// Stop forwarding
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for EventFilter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::{MemoryStore, SplitPath, VaultAction, VaultStore};
    use std::time::Duration;

    #[tokio::test]
    async fn test_forwards_external_and_drops_self_events() {
        let store = MemoryStore::new();
        let tracker = Arc::new(SelfEventTracker::default());
        let filter = EventFilter::spawn(store.subscribe(), tracker.clone());
        let mut rx = filter.subscribe();

        let ours = SplitPath::markdown("ours.md").unwrap();
        tracker
            .register(&[VaultAction::upsert(ours.clone(), "")], &store)
            .await;
        store.create_file(&ours, "").await.unwrap();

        let theirs = SplitPath::markdown("theirs.md").unwrap();
        store.create_file(&theirs, "").await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, VaultEvent::created("theirs.md"));
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[tokio::test]
    async fn test_second_echo_is_forwarded() {
        let store = MemoryStore::new();
        let tracker = Arc::new(SelfEventTracker::default());
        let filter = EventFilter::spawn(store.subscribe(), tracker.clone());
        let mut rx = filter.subscribe();

        let path = SplitPath::markdown("a.md").unwrap();
        store.create_file(&path, "").await.unwrap();
        let _ = rx.recv().await.unwrap();

        tracker
            .register(&[VaultAction::upsert(path.clone(), "1")], &store)
            .await;
        store.write(&path, "1").await.unwrap();
        store.write(&path, "2").await.unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event, VaultEvent::modified("a.md"));
        assert!(rx.try_recv().is_err());
    }
}
