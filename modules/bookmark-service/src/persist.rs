//! On-disk snapshot of the bookmark map.
//!
//! The whole map is written as one JSON object on every flush. There is no
//! temp-file rename, so a crash mid-write can leave a truncated file; the next
//! startup then begins with an empty store.

use crate::store::BookmarkStore;
use async_trait::async_trait;
use bookmark_types::Bookmarks;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum PersistError {
    Io { path: PathBuf, source: std::io::Error },
    Serialize(serde_json::Error),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            PersistError::Serialize(e) => write!(f, "serialising bookmarks: {}", e),
        }
    }
}

impl std::error::Error for PersistError {}

/// Destination for flushed snapshots.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn write(&self, snapshot: &Bookmarks) -> Result<(), PersistError>;
}

/// Writes snapshots to a single JSON file.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotSink for FileSink {
    async fn write(&self, snapshot: &Bookmarks) -> Result<(), PersistError> {
        let json = serde_json::to_vec(snapshot).map_err(PersistError::Serialize)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))
    }
}

pub fn read_snapshot(path: &Path) -> Result<Vec<u8>, PersistError> {
    std::fs::read(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the persisted snapshot into `store`, if there is a usable one.
///
/// Runs once at startup before any handler or the flusher touches the store.
pub fn hydrate(store: &BookmarkStore, path: &Path) {
    let bytes = match read_snapshot(path) {
        Ok(bytes) => bytes,
        Err(PersistError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "[BOOKMARKS] No saved bookmarks at {}, starting empty",
                path.display()
            );
            return;
        }
        Err(e) => {
            log::warn!("[BOOKMARKS] Could not read saved bookmarks: {}", e);
            return;
        }
    };

    if store.load_from(&bytes) {
        log::info!(
            "[BOOKMARKS] Loaded {} bookmarks from {}",
            store.len(),
            path.display()
        );
    }
}
