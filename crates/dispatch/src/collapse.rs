//! Batch collapsing
//!
//! Reduces an ordered action list to at most one action per identity key.
//! Each key runs a small state machine over {create, replace, process,
//! trash}, folding actions in the order they were submitted:
//!
//! - Trash is absorbing: it replaces whatever came before and nothing after
//!   it is accepted for that key
//! - A repeated rename to the same destination is dropped, a rename to a
//!   new destination replaces the old one
//! - Content replacement rewrites an earlier creation to carry the final
//!   content
//! - A process following known content is applied right away, producing a
//!   write of the transformed content
//! - Consecutive processes compose in submission order
//! - Anything else: the latest action wins
//!
//! Output keeps the order in which keys were first seen.

use ahash::AHashMap;
use quire_core::{ActionKey, VaultAction};
use tracing::{debug, trace};

/// Collapse `actions` into at most one action per identity key
pub async fn collapse(actions: Vec<VaultAction>) -> Vec<VaultAction> {
    let submitted = actions.len();
    let mut slots: Vec<Option<VaultAction>> = Vec::with_capacity(submitted);
    let mut index: AHashMap<ActionKey, usize> = AHashMap::with_capacity(submitted);

    for action in actions {
        let key = action.key();
        match index.get(&key) {
            Some(&slot) => {
                let merged = match slots[slot].take() {
                    Some(existing) => {
                        trace!("merging {} into {}", action, existing);
                        merge(existing, action).await
                    }
                    None => action,
                };
                slots[slot] = Some(merged);
            }
            None => {
                index.insert(key, slots.len());
                slots.push(Some(action));
            }
        }
    }

    let collapsed: Vec<VaultAction> = slots.into_iter().flatten().collect();
    debug!("collapsed {} actions into {}", submitted, collapsed.len());
    collapsed
}

/// Reduce two actions sharing a key, `new` having been submitted last
async fn merge(existing: VaultAction, new: VaultAction) -> VaultAction {
    use VaultAction::*;

    if existing.is_trash() {
        return existing;
    }
    if new.is_trash() {
        return new;
    }

    match (existing, new) {
        // Duplicate rename (same key, so same source)
        (existing, new)
            if existing.is_rename()
                && new.is_rename()
                && existing.destination() == new.destination() =>
        {
            existing
        }

        // "Ensure it exists" adds nothing to known content or a pending process
        (
            existing @ (UpsertMarkdownFile { content: Some(_), .. }
            | CreateFile { content: Some(_), .. }
            | ProcessMarkdownFile { .. }),
            UpsertMarkdownFile { content: None, .. } | CreateFile { content: None, .. },
        ) => existing,

        // Known content: apply the transform now
        (
            UpsertMarkdownFile {
                target,
                content: Some(content),
            },
            ProcessMarkdownFile { transform, .. },
        ) => UpsertMarkdownFile {
            target,
            content: Some(transform.apply(content).await),
        },
        (
            CreateFile {
                target,
                content: Some(content),
            },
            ProcessMarkdownFile { transform, .. },
        ) => CreateFile {
            target,
            content: Some(transform.apply(content).await),
        },

        (
            ProcessMarkdownFile {
                target,
                transform: first,
            },
            ProcessMarkdownFile {
                transform: second, ..
            },
        ) => ProcessMarkdownFile {
            target,
            transform: first.then(second),
        },

        // Covers renames to a new destination, creations rewritten with
        // final content, and processes on a not-yet-known file
        (_, new) => new,
    }
}
