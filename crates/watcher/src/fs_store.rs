//! Directory-backed vault store
//!
//! Nodes map one-to-one onto files and folders under a root directory.
//! Change notifications come from the platform watcher (via `notify`),
//! translated into vault-relative [`VaultEvent`]s and filtered through the
//! vault's [`IgnoreRules`].
//!
//! File contents are written to a staging file under the ignored `.quire/`
//! folder and renamed into place, and deleted folders are moved there before
//! removal. Each store operation therefore raises a single notification per
//! node, however many syscalls it takes.

use crate::ignore::{IgnoreConfig, IgnoreRules};
use async_trait::async_trait;
use notify::event::{EventKind as NotifyKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use quire_core::store::EVENT_CHANNEL_CAPACITY;
use quire_core::{normalize_path, SplitPath, StoreError, StoreResult, VaultEvent, VaultStore};
use serde::{Deserialize, Serialize};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Folder (under the vault root) that receives trashed nodes
pub const TRASH_DIR: &str = ".trash";

/// Folder (under the vault root) for content being written and nodes
/// being deleted
pub const STAGING_DIR: &str = ".quire/staging";

/// What trashing a node does on disk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashMode {
    /// Move into `<root>/.trash/`
    #[default]
    Local,
    /// Delete permanently
    Delete,
}

/// Options for [`FsStore`]
#[derive(Debug, Clone, Default)]
pub struct FsStoreOptions {
    pub trash: TrashMode,
    pub ignore: IgnoreConfig,
}

/// Store rooted at a directory on disk
pub struct FsStore {
    root: PathBuf,
    trash: TrashMode,
    events: broadcast::Sender<VaultEvent>,
    /// Keeps the platform watcher alive while the store is
    watcher: Option<RecommendedWatcher>,
}

impl FsStore {
    /// Open a store over `root` without watching for changes
    pub fn open(root: &Path, options: FsStoreOptions) -> StoreResult<Self> {
        let root = std::fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(StoreError::NotAFolder(root.display().to_string()));
        }

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            root,
            trash: options.trash,
            events,
            watcher: None,
        })
    }

    /// Open a store over `root` and start forwarding on-disk changes
    pub fn open_watched(root: &Path, options: FsStoreOptions) -> StoreResult<Self> {
        let ignore = IgnoreRules::load(root, options.ignore.clone())
            .map_err(|e| StoreError::Watch(e.to_string()))?;

        let mut store = Self::open(root, options)?;
        // Exists before the watcher starts so renames out of it pair up
        std::fs::create_dir_all(store.root.join(STAGING_DIR))?;
        let watcher = spawn_watcher(store.root.clone(), ignore, store.events.clone())?;
        store.watcher = Some(watcher);
        Ok(store)
    }

    /// Canonical vault root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether on-disk changes are being forwarded
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    fn full_path(&self, path: &SplitPath) -> PathBuf {
        let mut full = self.root.clone();
        for part in &path.path_parts {
            full.push(part);
        }
        full.push(path.file_name());
        full
    }

    /// Create each missing folder of `chain` one level at a time
    async fn ensure_folders(&self, chain: &[SplitPath]) -> StoreResult<()> {
        for folder in chain {
            let full = self.full_path(folder);
            match tokio::fs::metadata(&full).await {
                Ok(meta) if meta.is_dir() => continue,
                Ok(_) => return Err(StoreError::NotAFolder(folder.to_system_path())),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            match tokio::fs::create_dir(&full).await {
                Ok(()) => trace!("created folder {}", full.display()),
                // Lost a race with another writer; still a folder
                Err(e) if e.kind() == ErrorKind::AlreadyExists && full.is_dir() => {}
                Err(e) => return Err(map_io(e, folder)),
            }
        }
        Ok(())
    }

    async fn metadata(&self, path: &SplitPath) -> StoreResult<Option<std::fs::Metadata>> {
        match tokio::fs::metadata(self.full_path(path)).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fresh path inside the staging folder
    async fn staging_path(&self) -> StoreResult<PathBuf> {
        let staging = self.root.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging).await?;
        Ok(staging.join(ulid::Ulid::new().to_string().to_lowercase()))
    }

    /// Write `content` to a staging file and rename it over `path`
    async fn replace_with(&self, path: &SplitPath, content: &str) -> StoreResult<()> {
        let staged = self.staging_path().await?;
        tokio::fs::write(&staged, content).await?;

        if let Err(e) = tokio::fs::rename(&staged, self.full_path(path)).await {
            if let Err(cleanup) = tokio::fs::remove_file(&staged).await {
                warn!("Failed to remove staged file {}: {}", staged.display(), cleanup);
            }
            return Err(map_io(e, path));
        }
        Ok(())
    }

    /// Unused destination inside the trash folder for `path`
    async fn trash_destination(&self, path: &SplitPath) -> StoreResult<PathBuf> {
        let trash_root = self.root.join(TRASH_DIR);
        tokio::fs::create_dir_all(&trash_root).await?;

        let candidate = trash_root.join(path.file_name());
        if tokio::fs::metadata(&candidate).await.is_err() {
            return Ok(candidate);
        }

        let suffix = ulid::Ulid::new().to_string().to_lowercase();
        let name = match &path.extension {
            Some(ext) => format!("{}-{}.{}", path.basename, suffix, ext),
            None => format!("{}-{}", path.basename, suffix),
        };
        Ok(trash_root.join(name))
    }
}

fn map_io(err: io::Error, path: &SplitPath) -> StoreError {
    match err.kind() {
        ErrorKind::NotFound => StoreError::NotFound(path.to_system_path()),
        ErrorKind::AlreadyExists => StoreError::AlreadyExists(path.to_system_path()),
        _ => StoreError::Io(err),
    }
}

#[async_trait]
impl VaultStore for FsStore {
    async fn exists(&self, path: &SplitPath) -> StoreResult<bool> {
        Ok(self.metadata(path).await?.is_some())
    }

    async fn create_folder(&self, path: &SplitPath) -> StoreResult<()> {
        let mut chain = path.ancestors();
        chain.push(path.clone());
        self.ensure_folders(&chain).await
    }

    async fn create_file(&self, path: &SplitPath, content: &str) -> StoreResult<()> {
        self.ensure_folders(&path.ancestors()).await?;
        if self.metadata(path).await?.is_some() {
            return Err(StoreError::AlreadyExists(path.to_system_path()));
        }
        self.replace_with(path, content).await
    }

    async fn read(&self, path: &SplitPath) -> StoreResult<String> {
        match self.metadata(path).await? {
            Some(meta) if meta.is_dir() => Err(StoreError::NotAFile(path.to_system_path())),
            Some(_) => Ok(tokio::fs::read_to_string(self.full_path(path))
                .await
                .map_err(|e| map_io(e, path))?),
            None => Err(StoreError::NotFound(path.to_system_path())),
        }
    }

    async fn write(&self, path: &SplitPath, content: &str) -> StoreResult<()> {
        match self.metadata(path).await? {
            Some(meta) if meta.is_dir() => Err(StoreError::NotAFile(path.to_system_path())),
            Some(_) => self.replace_with(path, content).await,
            None => Err(StoreError::NotFound(path.to_system_path())),
        }
    }

    async fn rename(&self, from: &SplitPath, to: &SplitPath) -> StoreResult<()> {
        if from.to_system_path() == to.to_system_path() {
            return Ok(());
        }
        if self.metadata(from).await?.is_none() {
            return Err(StoreError::NotFound(from.to_system_path()));
        }
        if self.metadata(to).await?.is_some() {
            return Err(StoreError::AlreadyExists(to.to_system_path()));
        }

        self.ensure_folders(&to.ancestors()).await?;
        tokio::fs::rename(self.full_path(from), self.full_path(to))
            .await
            .map_err(|e| map_io(e, from))
    }

    async fn trash(&self, path: &SplitPath) -> StoreResult<()> {
        let meta = self
            .metadata(path)
            .await?
            .ok_or_else(|| StoreError::NotFound(path.to_system_path()))?;
        let full = self.full_path(path);

        match self.trash {
            TrashMode::Delete if meta.is_dir() => {
                // One removal notification for the folder, none for its contents
                let staged = self.staging_path().await?;
                tokio::fs::rename(&full, &staged).await?;
                tokio::fs::remove_dir_all(&staged).await?;
            }
            TrashMode::Delete => tokio::fs::remove_file(&full).await?,
            TrashMode::Local => {
                let destination = self.trash_destination(path).await?;
                debug!("trashing {} -> {}", full.display(), destination.display());
                tokio::fs::rename(&full, &destination).await?;
            }
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<VaultEvent> {
        self.events.subscribe()
    }
}

/// Start a recursive platform watcher feeding `events`
fn spawn_watcher(
    root: PathBuf,
    ignore: IgnoreRules,
    events: broadcast::Sender<VaultEvent>,
) -> StoreResult<RecommendedWatcher> {
    let ignore = Arc::new(ignore);
    let watch_root = root.clone();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => {
                for vault_event in translate(&event, &watch_root, &ignore) {
                    // No subscribers is fine
                    let _ = events.send(vault_event);
                }
            }
            Err(e) => warn!("Watcher error: {}", e),
        }
    })
    .map_err(|e| StoreError::Watch(e.to_string()))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| StoreError::Watch(e.to_string()))?;

    debug!("watching {}", root.display());
    Ok(watcher)
}

/// Vault-relative, normalized form of an absolute watcher path
fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let normalized = normalize_path(&rel.to_string_lossy());
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Translate one platform event into vault notifications
///
/// Single-sided rename halves (`From`/`To`/`Any`) are skipped; inotify
/// follows them with a paired `Both` event carrying both endpoints.
fn translate(event: &notify::Event, root: &Path, ignore: &IgnoreRules) -> Vec<VaultEvent> {
    let visible = |path: &Path| relative(root, path).filter(|rel| !ignore.should_ignore(rel));

    match event.kind {
        NotifyKind::Create(_) => event
            .paths
            .iter()
            .filter_map(|p| visible(p))
            .map(VaultEvent::created)
            .collect(),
        NotifyKind::Remove(_) => event
            .paths
            .iter()
            .filter_map(|p| visible(p))
            .map(VaultEvent::deleted)
            .collect(),
        NotifyKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() >= 2 => {
            match (visible(&event.paths[0]), visible(&event.paths[1])) {
                (Some(from), Some(to)) => vec![VaultEvent::renamed(from, to)],
                // Moved into an ignored folder (e.g. the trash)
                (Some(from), None) => vec![VaultEvent::deleted(from)],
                // Moved out of an ignored folder
                (None, Some(to)) => vec![VaultEvent::created(to)],
                (None, None) => vec![],
            }
        }
        NotifyKind::Modify(ModifyKind::Name(_)) | NotifyKind::Modify(ModifyKind::Metadata(_)) => {
            trace!("skipping watcher event {:?}", event.kind);
            vec![]
        }
        NotifyKind::Modify(_) => event
            .paths
            .iter()
            .filter_map(|p| visible(p))
            .map(VaultEvent::modified)
            .collect(),
        NotifyKind::Access(_) | NotifyKind::Any | NotifyKind::Other => vec![],
    }
}
