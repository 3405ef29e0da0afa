//! "Must happen before" edges between collapsed actions
//!
//! Nodes are indices into the collapsed batch, assigned once per batch.
//! Edges only ever point from an action toward actions on its own ancestor
//! folders (or, for a process, toward the creation of the same file):
//!
//! - File creations, writes and processes follow `CreateFolder` actions for
//!   any of their ancestor folders present in the batch
//! - A process also follows the creation or write of the same path
//! - A rename follows `CreateFolder` actions for its destination's ancestors
//! - A folder creation follows `CreateFolder` actions for its own ancestors
//! - Trashes depend on nothing
//!
//! Folders that already exist in the store are not nodes here; only
//! ancestors created within the same batch produce edges.

use ahash::AHashMap;
use quire_core::{ActionKey, SplitPath, VaultAction};
use smallvec::SmallVec;
use tracing::trace;

/// Edge list; most actions have only a handful of in-batch ancestors
pub type Edges = SmallVec<[usize; 4]>;

/// One action together with its incoming and outgoing edges
#[derive(Debug)]
pub struct GraphNode {
    pub action: VaultAction,
    /// Actions that must execute before this one
    pub depends_on: Edges,
    /// Actions waiting on this one
    pub required_by: Edges,
}

/// Dependency graph over one collapsed batch
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<GraphNode>,
    index: AHashMap<ActionKey, usize>,
}

impl DependencyGraph {
    /// Derive all edges for `actions`
    ///
    /// `actions` is expected to be collapsed (one action per key); a
    /// duplicate key resolves to its last occurrence.
    pub fn build(actions: Vec<VaultAction>) -> Self {
        let mut graph = Self {
            nodes: Vec::with_capacity(actions.len()),
            index: AHashMap::with_capacity(actions.len()),
        };

        // Lookup tables for the two kinds of prerequisite
        let mut folder_creations: AHashMap<String, usize> = AHashMap::new();
        let mut file_creations: AHashMap<String, usize> = AHashMap::new();

        for (id, action) in actions.into_iter().enumerate() {
            match &action {
                VaultAction::CreateFolder { target } => {
                    folder_creations.insert(target.to_system_path(), id);
                }
                VaultAction::CreateFile { target, .. }
                | VaultAction::UpsertMarkdownFile { target, .. } => {
                    file_creations.insert(target.to_system_path(), id);
                }
                _ => {}
            }
            graph.index.insert(action.key(), id);
            graph.nodes.push(GraphNode {
                action,
                depends_on: Edges::new(),
                required_by: Edges::new(),
            });
        }

        for id in 0..graph.nodes.len() {
            let edges = prerequisites(&graph.nodes[id].action, &folder_creations, &file_creations);
            for prerequisite in edges {
                if prerequisite != id {
                    graph.add_edge(id, prerequisite);
                }
            }
        }

        graph
    }

    /// Record that `dependent` must run after `prerequisite`
    pub(crate) fn add_edge(&mut self, dependent: usize, prerequisite: usize) {
        if self.nodes[dependent].depends_on.contains(&prerequisite) {
            return;
        }
        trace!(
            "edge: {} after {}",
            self.nodes[dependent].action,
            self.nodes[prerequisite].action
        );
        self.nodes[dependent].depends_on.push(prerequisite);
        self.nodes[prerequisite].required_by.push(dependent);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Node id of the action with `key`
    pub fn id_of(&self, key: &ActionKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Actions the action with `key` must follow
    pub fn dependencies_of(&self, key: &ActionKey) -> Vec<&VaultAction> {
        self.id_of(key)
            .map(|id| {
                self.nodes[id]
                    .depends_on
                    .iter()
                    .map(|&dep| &self.nodes[dep].action)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.depends_on.len()).sum()
    }

    pub(crate) fn into_nodes(self) -> Vec<GraphNode> {
        self.nodes
    }
}

/// Ids of in-batch actions `action` must follow
fn prerequisites(
    action: &VaultAction,
    folder_creations: &AHashMap<String, usize>,
    file_creations: &AHashMap<String, usize>,
) -> Edges {
    let ancestor_folders = |path: &SplitPath| -> Edges {
        path.ancestor_paths()
            .iter()
            .filter_map(|ancestor| folder_creations.get(ancestor).copied())
            .collect()
    };

    match action {
        VaultAction::CreateFolder { target }
        | VaultAction::CreateFile { target, .. }
        | VaultAction::UpsertMarkdownFile { target, .. } => ancestor_folders(target),
        VaultAction::ProcessMarkdownFile { target, .. } => {
            let mut edges = ancestor_folders(target);
            if let Some(&creation) = file_creations.get(&target.to_system_path()) {
                edges.push(creation);
            }
            edges
        }
        VaultAction::RenameFolder { to, .. }
        | VaultAction::RenameFile { to, .. }
        | VaultAction::RenameMarkdownFile { to, .. } => ancestor_folders(to),
        VaultAction::TrashFolder { .. } | VaultAction::TrashFile { .. } => Edges::new(),
    }
}
