//! Randomized checks of collapse and ordering invariants
//!
//! Batches are drawn from a small path pool so keys collide often.
//! Generators are seeded, so any failure reproduces.

use dispatch::{collapse, plan, DependencyGraph, Dispatcher, DispatcherConfig};
use quire_core::{ActionKey, ActionKind, MemoryStore, SplitPath, VaultAction};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::sync::Arc;

const SEEDS: u64 = 64;
const FOLDERS: &[&str] = &["a", "a/b", "a/b/c", "d", "d/e"];
const NOTES: &[&str] = &["a/x.md", "a/b/y.md", "a/b/c/z.md", "d/w.md", "top.md"];

/// Distinct identity keys of a batch
fn keys(actions: &[VaultAction]) -> HashSet<ActionKey> {
    actions.iter().map(|a| a.key()).collect()
}

fn random_action(rng: &mut ChaCha8Rng) -> VaultAction {
    let folder = SplitPath::folder(FOLDERS.choose(rng).copied().unwrap_or("a")).unwrap();
    let note = SplitPath::markdown(NOTES.choose(rng).copied().unwrap_or("top.md")).unwrap();
    let suffix: u8 = rng.gen_range(b'a'..=b'z');

    match rng.gen_range(0..8) {
        0 => VaultAction::create_folder(folder),
        1 => VaultAction::trash(folder),
        2 => VaultAction::upsert(note, (suffix as char).to_string()),
        3 => VaultAction::UpsertMarkdownFile {
            target: note,
            content: None,
        },
        4 | 5 => VaultAction::process(note, move |c| format!("{}{}", c, suffix as char)),
        6 => VaultAction::trash(note),
        _ => {
            let to = SplitPath::markdown(NOTES.choose(rng).copied().unwrap_or("top.md")).unwrap();
            VaultAction::rename(note, to)
        }
    }
}

fn random_batch(seed: u64) -> Vec<VaultAction> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let len = rng.gen_range(1..40);
    (0..len).map(|_| random_action(&mut rng)).collect()
}

#[tokio::test]
async fn test_collapse_yields_one_action_per_key() {
    for seed in 0..SEEDS {
        let batch = random_batch(seed);
        let expected = keys(&batch);

        let collapsed = collapse(batch).await;
        assert_eq!(collapsed.len(), expected.len(), "seed {}", seed);
        assert_eq!(keys(&collapsed), expected, "seed {}", seed);
    }
}

#[tokio::test]
async fn test_collapse_is_idempotent() {
    for seed in 0..SEEDS {
        let once = collapse(random_batch(seed)).await;
        let rendered: Vec<String> = once.iter().map(|a| a.to_string()).collect();

        let twice = collapse(once).await;
        let rerendered: Vec<String> = twice.iter().map(|a| a.to_string()).collect();
        assert_eq!(rendered, rerendered, "seed {}", seed);
    }
}

#[tokio::test]
async fn test_trailing_trash_wins() {
    for seed in 0..SEEDS {
        let mut batch = random_batch(seed);
        let target = batch[0].source().clone();
        batch.push(VaultAction::trash(target.clone()));

        let collapsed = collapse(batch).await;
        let survivor = collapsed
            .iter()
            .find(|a| a.source() == &target)
            .unwrap();
        assert!(survivor.is_trash(), "seed {}: got {}", seed, survivor);
        assert!(
            matches!(survivor.kind(), ActionKind::TrashFile | ActionKind::TrashFolder),
            "seed {}",
            seed
        );
    }
}

#[tokio::test]
async fn test_chained_processes_compose() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for n in 1..12 {
        let letters: Vec<char> = (0..n).map(|_| rng.gen_range(b'a'..=b'z') as char).collect();
        let batch: Vec<VaultAction> = letters
            .iter()
            .map(|&ch| {
                let target = SplitPath::markdown("p.md").unwrap();
                VaultAction::process(target, move |c| format!("{}{}", c, ch))
            })
            .collect();

        let collapsed = collapse(batch).await;
        assert_eq!(collapsed.len(), 1);
        let result = match &collapsed[0] {
            VaultAction::ProcessMarkdownFile { transform, .. } => {
                transform.apply("c".to_string()).await
            }
            other => panic!("expected a process, got {}", other),
        };
        let expected: String = std::iter::once('c').chain(letters.iter().copied()).collect();
        assert_eq!(result, expected);
    }
}

#[tokio::test]
async fn test_folder_creation_precedes_contents() {
    for seed in 0..SEEDS {
        let sorted = plan(random_batch(seed)).await.unwrap();

        for (i, later) in sorted.iter().enumerate() {
            for after in &sorted[i + 1..] {
                if let VaultAction::CreateFolder { target } = after {
                    let blocked = match later {
                        VaultAction::TrashFolder { .. } | VaultAction::TrashFile { .. } => false,
                        other => target.is_ancestor_of(other.destination()),
                    };
                    assert!(
                        !blocked,
                        "seed {}: {} scheduled before {}",
                        seed, later, after
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn test_sort_keeps_every_action() {
    for seed in 0..SEEDS {
        let collapsed = collapse(random_batch(seed)).await;
        let expected = collapsed.len();
        let graph = DependencyGraph::build(collapsed);
        let sorted = dispatch::topological_sort(graph).unwrap();
        assert_eq!(sorted.len(), expected, "seed {}", seed);
    }
}

#[tokio::test]
async fn test_shuffled_folder_batches_converge() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..16 {
        let mut batch: Vec<VaultAction> = FOLDERS
            .iter()
            .map(|f| VaultAction::create_folder(SplitPath::folder(f).unwrap()))
            .collect();
        batch.shuffle(&mut rng);

        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(store.clone(), DispatcherConfig::default());
        dispatcher.dispatch(batch).await.unwrap();

        for folder in FOLDERS {
            assert!(store.has_folder(folder), "{} missing", folder);
        }
    }
}
