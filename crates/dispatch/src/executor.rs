//! Applying single actions to a store
//!
//! Each action is made idempotent against the store's current state, so a
//! batch replayed after a partial failure converges instead of erroring on
//! the parts that already landed. Actions that find nothing to do report
//! [`Outcome::Unchanged`]: the store raised no notification for them.

use quire_core::{SplitPath, StoreError, StoreResult, VaultAction, VaultStore};
use tracing::trace;

/// What executing one action did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store was changed
    Applied,
    /// Already in the requested state; nothing was touched
    Unchanged,
}

/// Execute one action against `store`
pub async fn execute<S>(store: &S, action: &VaultAction) -> StoreResult<Outcome>
where
    S: VaultStore + ?Sized,
{
    trace!("executing {}", action);
    match action {
        VaultAction::CreateFolder { target } => {
            let existed = store.exists(target).await?;
            store.create_folder(target).await?;
            Ok(if existed {
                Outcome::Unchanged
            } else {
                Outcome::Applied
            })
        }
        VaultAction::CreateFile { target, content }
        | VaultAction::UpsertMarkdownFile { target, content } => {
            put(store, target, content.as_deref()).await
        }
        VaultAction::ProcessMarkdownFile { target, transform } => {
            let current = match store.read(target).await {
                Ok(content) => Some(content),
                Err(StoreError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };
            let input = current.clone().unwrap_or_default();
            let output = transform.apply(input).await;

            match current {
                Some(before) if before == output => Ok(Outcome::Unchanged),
                Some(_) => applied(store.write(target, &output).await),
                None => applied(store.create_file(target, &output).await),
            }
        }
        VaultAction::RenameFolder { from, to }
        | VaultAction::RenameFile { from, to }
        | VaultAction::RenameMarkdownFile { from, to } => rename(store, from, to).await,
        VaultAction::TrashFolder { target } | VaultAction::TrashFile { target } => {
            match store.trash(target).await {
                Ok(()) => Ok(Outcome::Applied),
                Err(StoreError::NotFound(_)) => {
                    trace!("{} already gone", target);
                    Ok(Outcome::Unchanged)
                }
                Err(e) => Err(e),
            }
        }
    }
}

fn applied(result: StoreResult<()>) -> StoreResult<Outcome> {
    result.map(|()| Outcome::Applied)
}

/// Create with `content` (empty when absent); overwrite only when given
async fn put<S>(store: &S, target: &SplitPath, content: Option<&str>) -> StoreResult<Outcome>
where
    S: VaultStore + ?Sized,
{
    if store.exists(target).await? {
        return overwrite(store, target, content).await;
    }
    match store.create_file(target, content.unwrap_or_default()).await {
        Ok(()) => Ok(Outcome::Applied),
        // Created concurrently between the check and the create
        Err(StoreError::AlreadyExists(_)) => overwrite(store, target, content).await,
        Err(e) => Err(e),
    }
}

async fn overwrite<S>(store: &S, target: &SplitPath, content: Option<&str>) -> StoreResult<Outcome>
where
    S: VaultStore + ?Sized,
{
    match content {
        Some(content) => applied(store.write(target, content).await),
        None => Ok(Outcome::Unchanged),
    }
}

/// Rename, treating "source gone, destination present" as already applied
async fn rename<S>(store: &S, from: &SplitPath, to: &SplitPath) -> StoreResult<Outcome>
where
    S: VaultStore + ?Sized,
{
    if from.to_system_path() == to.to_system_path() {
        return Ok(Outcome::Unchanged);
    }
    match store.rename(from, to).await {
        Ok(()) => Ok(Outcome::Applied),
        Err(StoreError::NotFound(missing)) => {
            if store.exists(to).await? {
                trace!("{} already renamed to {}", from, to);
                Ok(Outcome::Unchanged)
            } else {
                Err(StoreError::NotFound(missing))
            }
        }
        Err(e) => Err(e),
    }
}
