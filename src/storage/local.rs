//! Local filesystem storage implementation.
//!
//! Snapshots and deltas are pretty-printed JSON with non-ASCII text written
//! literally. JSON files are replaced atomically (write to temp, then rename).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Delta, Snapshot};
use crate::storage::TourStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Get the full path for a relative key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(value)?;
        bytes.push(b'\n');
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TourStorage for LocalStorage {
    async fn load_snapshot(&self, key: &str) -> Result<Option<Snapshot>> {
        let snapshot: Option<Snapshot> = self.read_json(key).await?;
        match &snapshot {
            Some(s) => log::debug!("Loaded {} tours from {}", s.tours.len(), key),
            None => log::info!("No previous snapshot at {}", self.path(key).display()),
        }
        Ok(snapshot)
    }

    async fn save_snapshot(&self, key: &str, snapshot: &Snapshot) -> Result<()> {
        self.write_json(key, snapshot).await?;
        log::info!(
            "Saved {} tours to {}",
            snapshot.tour_count,
            self.path(key).display()
        );
        Ok(())
    }

    async fn save_delta(&self, key: &str, delta: &Delta) -> Result<()> {
        self.write_json(key, delta).await?;
        log::info!("Saved delta to {}", self.path(key).display());
        Ok(())
    }

    async fn append_changelog(&self, key: &str, entry: &str) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;

        log::info!("Appended change log entry to {}", path.display());
        Ok(())
    }
}
