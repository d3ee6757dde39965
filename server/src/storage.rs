//! Download directory: persist processed images, report usage and sweep
//! files past the retention window.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid file name: {0}")]
    InvalidName(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub file_count: u64,
    pub total_size: u64,
    #[serde(rename = "totalSizeMB")]
    pub total_size_mb: String,
}

pub struct Storage {
    root: PathBuf,
    retention: Duration,
}

impl Storage {
    /// Open the storage root, creating it when missing.
    pub async fn init(root: impl Into<PathBuf>, retention: Duration) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root, retention })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn persist(&self, data: &[u8], filename: &str) -> Result<StoredFile, StorageError> {
        let path = self.path_for(filename)?;
        fs::write(&path, data).await.map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(StoredFile {
            filename: filename.to_string(),
            path,
            url: format!("/downloads/{filename}"),
        })
    }

    /// `false` when the file did not exist.
    pub async fn delete(&self, filename: &str) -> Result<bool, StorageError> {
        let path = self.path_for(filename)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    pub async fn stats(&self) -> Result<StorageStats, StorageError> {
        let mut file_count = 0;
        let mut total_size = 0;

        for (path, metadata) in self.entries().await? {
            if metadata.is_file() {
                file_count += 1;
                total_size += metadata.len();
            } else {
                log::debug!("Skipping non-file entry {}", path.display());
            }
        }

        Ok(StorageStats {
            file_count,
            total_size,
            total_size_mb: format!("{:.2}", total_size as f64 / (1024.0 * 1024.0)),
        })
    }

    /// Delete files whose modification time is older than the retention
    /// window. Per-file failures are logged and skipped.
    pub async fn sweep(&self) -> Result<usize, StorageError> {
        let now = SystemTime::now();
        let mut deleted = 0;

        for (path, metadata) in self.entries().await? {
            if !metadata.is_file() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .unwrap_or_default();
            if age <= self.retention {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match self.delete(name).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => log::error!("Failed to delete {}: {}", path.display(), e),
            }
        }

        log::info!("Cleaned {} old files from storage", deleted);
        Ok(deleted)
    }

    async fn entries(&self) -> Result<Vec<(PathBuf, std::fs::Metadata)>, StorageError> {
        let io_err = |source: io::Error| StorageError::Io {
            path: self.root.clone(),
            source,
        };

        let mut dir = fs::read_dir(&self.root).await.map_err(io_err)?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(io_err)? {
            match entry.metadata().await {
                Ok(metadata) => entries.push((entry.path(), metadata)),
                Err(e) => log::error!("Failed to stat {}: {}", entry.path().display(), e),
            }
        }
        Ok(entries)
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let plain = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains(['/', '\\']);
        if !plain {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        Ok(self.root.join(filename))
    }
}
