//! Registry of keys that expire after a fixed TTL
//!
//! Each registration owns a timer task. Re-registering a key cancels its
//! timer and starts a new one; consuming a key cancels the timer and removes
//! the entry. Timers only remove the registration that spawned them, so a
//! late-firing timer never evicts a newer registration of the same key.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

struct Registration {
    generation: u64,
    timer: JoinHandle<()>,
}

/// TTL-expiring, single-use-per-entry set of keys
///
/// Registration spawns onto the current tokio runtime.
pub struct ExpiringRegistry<K>
where
    K: Eq + Hash,
{
    ttl: Duration,
    entries: Arc<DashMap<K, Registration>>,
    generation: AtomicU64,
}

impl<K> ExpiringRegistry<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create an empty registry whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Time-to-live of each registration
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Track `key`, restarting its timer if it is already tracked
    pub fn register(&self, key: K) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);

        // The shard stays locked until the new registration is stored, so
        // the timer cannot run its removal before the entry exists.
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let timer = self.spawn_timer(key, generation);
                let previous = occupied.insert(Registration { generation, timer });
                previous.timer.abort();
            }
            Entry::Vacant(vacant) => {
                let timer = self.spawn_timer(key, generation);
                vacant.insert(Registration { generation, timer });
            }
        }
    }

    /// Remove `key` if tracked, reporting whether it was
    pub fn consume(&self, key: &K) -> bool {
        match self.entries.remove(key) {
            Some((_, registration)) => {
                registration.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Whether `key` is currently tracked
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every registration and cancel all timers
    pub fn clear(&self) {
        self.entries.retain(|_, registration| {
            registration.timer.abort();
            false
        });
    }

    fn spawn_timer(&self, key: K, generation: u64) -> JoinHandle<()> {
        let entries = Arc::downgrade(&self.entries);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(entries) = entries.upgrade() {
                entries.remove_if(&key, |_, registration| registration.generation == generation);
            }
        })
    }
}

impl<K> Drop for ExpiringRegistry<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        for registration in self.entries.iter() {
            registration.timer.abort();
        }
    }
}
