// Load-once cache for artifacts, invalidated when the file changes on disk
use crate::application::error::{DashboardError, Result};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

/// Identity of a file's contents as far as the cache is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(metadata: &std::fs::Metadata) -> Self {
        Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        }
    }
}

pub fn artifact_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn io_error(path: &Path, source: std::io::Error) -> DashboardError {
    if source.kind() == ErrorKind::NotFound {
        DashboardError::MissingArtifact {
            name: artifact_name(path),
            path: path.to_path_buf(),
        }
    } else {
        DashboardError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Stat a file, mapping "not found" to [`DashboardError::MissingArtifact`].
pub async fn stamp(path: &Path) -> Result<FileStamp> {
    tokio::fs::metadata(path)
        .await
        .map(|m| FileStamp::of(&m))
        .map_err(|e| io_error(path, e))
}

pub async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| io_error(path, e))
}

struct Entry<T> {
    stamp: FileStamp,
    value: Arc<T>,
}

/// Parsed artifacts keyed by path. Values are immutable once cached; a
/// changed stamp replaces the entry, a vanished file evicts it.
pub struct MemoCache<T> {
    entries: RwLock<HashMap<PathBuf, Entry<T>>>,
}

impl<T> Default for MemoCache<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> MemoCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lookup(&self, path: &Path, stamp: FileStamp) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(path)
            .filter(|entry| entry.stamp == stamp)
            .map(|entry| entry.value.clone())
    }

    fn evict(&self, path: &Path) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }

    /// Return the cached value for `path`, running `parse` on the file's
    /// bytes when nothing is cached or the file changed since it was parsed.
    pub async fn get_or_load<F>(&self, path: &Path, parse: F) -> Result<Arc<T>>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        let stamp = match stamp(path).await {
            Ok(stamp) => stamp,
            Err(e) => {
                self.evict(path);
                return Err(e);
            }
        };

        if let Some(value) = self.lookup(path, stamp) {
            tracing::trace!("Cache hit for {}", path.display());
            return Ok(value);
        }

        let bytes = read(path).await?;
        let value = Arc::new(parse(&bytes)?);
        tracing::debug!("Loaded {} ({} bytes)", path.display(), bytes.len());

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                path.to_path_buf(),
                Entry {
                    stamp,
                    value: value.clone(),
                },
            );
        Ok(value)
    }
}
