//! In-memory vault store
//!
//! Behaves like a real store as far as the dispatcher can tell: implicit
//! parent creation, subtree moves on folder rename, and one notification
//! per node actually created, changed, moved or removed.

use crate::event::VaultEvent;
use crate::path::{normalize_path, SplitPath};
use crate::store::{StoreError, StoreResult, VaultStore, EVENT_CHANNEL_CAPACITY};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Folder,
    File(String),
}

/// Store keeping every node in a path-ordered map
pub struct MemoryStore {
    nodes: Mutex<BTreeMap<String, Node>>,
    events: broadcast::Sender<VaultEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            nodes: Mutex::new(BTreeMap::new()),
            events,
        }
    }

    /// All node paths, sorted
    pub fn paths(&self) -> Vec<String> {
        self.nodes.lock().keys().cloned().collect()
    }

    /// Whether a folder exists at the normalized `path`
    pub fn has_folder(&self, path: &str) -> bool {
        matches!(self.nodes.lock().get(&normalize_path(path)), Some(Node::Folder))
    }

    /// Content of the file at the normalized `path`
    pub fn file_content(&self, path: &str) -> Option<String> {
        match self.nodes.lock().get(&normalize_path(path)) {
            Some(Node::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    fn emit(&self, event: VaultEvent) {
        tracing::trace!("memory store event: {}", event);
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Create every missing folder in `chain` (shallowest first)
    fn ensure_folders(
        &self,
        nodes: &mut BTreeMap<String, Node>,
        chain: &[String],
        pending: &mut Vec<VaultEvent>,
    ) -> StoreResult<()> {
        for folder in chain {
            match nodes.get(folder) {
                Some(Node::Folder) => {}
                Some(Node::File(_)) => return Err(StoreError::NotAFolder(folder.clone())),
                None => {
                    nodes.insert(folder.clone(), Node::Folder);
                    pending.push(VaultEvent::created(folder));
                }
            }
        }
        Ok(())
    }

    fn flush(&self, pending: Vec<VaultEvent>) {
        for event in pending {
            self.emit(event);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_under(candidate: &str, folder: &str) -> bool {
    candidate.len() > folder.len()
        && candidate.starts_with(folder)
        && candidate.as_bytes()[folder.len()] == b'/'
}

#[async_trait]
impl VaultStore for MemoryStore {
    async fn exists(&self, path: &SplitPath) -> StoreResult<bool> {
        Ok(self.nodes.lock().contains_key(&path.to_system_path()))
    }

    async fn create_folder(&self, path: &SplitPath) -> StoreResult<()> {
        let mut chain = path.ancestor_paths();
        chain.push(path.to_system_path());

        let mut pending = Vec::new();
        let result = {
            let mut nodes = self.nodes.lock();
            self.ensure_folders(&mut nodes, &chain, &mut pending)
        };
        self.flush(pending);
        result
    }

    async fn create_file(&self, path: &SplitPath, content: &str) -> StoreResult<()> {
        let key = path.to_system_path();
        let mut pending = Vec::new();
        let result = {
            let mut nodes = self.nodes.lock();
            if nodes.contains_key(&key) {
                Err(StoreError::AlreadyExists(key.clone()))
            } else {
                self.ensure_folders(&mut nodes, &path.ancestor_paths(), &mut pending)
                    .map(|()| {
                        nodes.insert(key.clone(), Node::File(content.to_string()));
                        pending.push(VaultEvent::created(&key));
                    })
            }
        };
        self.flush(pending);
        result
    }

    async fn read(&self, path: &SplitPath) -> StoreResult<String> {
        let key = path.to_system_path();
        match self.nodes.lock().get(&key) {
            Some(Node::File(content)) => Ok(content.clone()),
            Some(Node::Folder) => Err(StoreError::NotAFile(key)),
            None => Err(StoreError::NotFound(key)),
        }
    }

    async fn write(&self, path: &SplitPath, content: &str) -> StoreResult<()> {
        let key = path.to_system_path();
        {
            let mut nodes = self.nodes.lock();
            match nodes.get_mut(&key) {
                Some(Node::File(existing)) => *existing = content.to_string(),
                Some(Node::Folder) => return Err(StoreError::NotAFile(key)),
                None => return Err(StoreError::NotFound(key)),
            }
        }
        self.emit(VaultEvent::modified(&key));
        Ok(())
    }

    async fn rename(&self, from: &SplitPath, to: &SplitPath) -> StoreResult<()> {
        let from_key = from.to_system_path();
        let to_key = to.to_system_path();
        if from_key == to_key {
            return Ok(());
        }
        if is_under(&to_key, &from_key) {
            return Err(StoreError::InvalidPath(format!(
                "cannot move {} into itself ({})",
                from_key, to_key
            )));
        }

        let mut pending = Vec::new();
        let result = {
            let mut nodes = self.nodes.lock();
            if !nodes.contains_key(&from_key) {
                Err(StoreError::NotFound(from_key.clone()))
            } else if nodes.contains_key(&to_key) {
                Err(StoreError::AlreadyExists(to_key.clone()))
            } else {
                self.ensure_folders(&mut nodes, &to.ancestor_paths(), &mut pending)
                    .map(|()| {
                        let moved: Vec<String> = nodes
                            .keys()
                            .filter(|k| **k == from_key || is_under(k, &from_key))
                            .cloned()
                            .collect();
                        for old in moved {
                            if let Some(node) = nodes.remove(&old) {
                                let new = format!("{}{}", to_key, &old[from_key.len()..]);
                                nodes.insert(new, node);
                            }
                        }
                        pending.push(VaultEvent::renamed(&from_key, &to_key));
                    })
            }
        };
        self.flush(pending);
        result
    }

    async fn trash(&self, path: &SplitPath) -> StoreResult<()> {
        let key = path.to_system_path();
        {
            let mut nodes = self.nodes.lock();
            if nodes.remove(&key).is_none() {
                return Err(StoreError::NotFound(key));
            }
            nodes.retain(|k, _| !is_under(k, &key));
        }
        self.emit(VaultEvent::deleted(&key));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }
}
