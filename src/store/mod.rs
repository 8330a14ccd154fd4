//! Media store
//!
//! Persists captured files into a single capture directory, named by creation
//! time in milliseconds plus extension.

pub mod compress;

use crate::config::StorageConfig;
use crate::errors::StorageError;
use crate::types::{CapturedArtifact, MediaKind};
use async_trait::async_trait;
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use compress::compress_photo;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Copy `source` into durable storage.
    async fn persist(&self, source: &Path, kind: MediaKind) -> Result<CapturedArtifact, StorageError>;

    /// Size in bytes; fails if the file does not exist.
    async fn size_of(&self, uri: &Path) -> Result<u64, StorageError>;

    /// Remove a file. Removing an absent file succeeds.
    async fn delete(&self, uri: &Path) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: MediaStore + ?Sized> MediaStore for Arc<T> {
    async fn persist(&self, source: &Path, kind: MediaKind) -> Result<CapturedArtifact, StorageError> {
        (**self).persist(source, kind).await
    }

    async fn size_of(&self, uri: &Path) -> Result<u64, StorageError> {
        (**self).size_of(uri).await
    }

    async fn delete(&self, uri: &Path) -> Result<(), StorageError> {
        (**self).delete(uri).await
    }
}

/// Filesystem-backed store rooted at the capture directory
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    photo_extension: String,
    fallback_video_extension: String,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            photo_extension: "jpg".to_string(),
            fallback_video_extension: "mp4".to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.capture_directory),
            photo_extension: config.photo_extension.clone(),
            fallback_video_extension: config.fallback_video_extension.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the capture directory if it is missing
    pub async fn ensure_directory(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::CreateDirectory {
                path: self.root.clone(),
                source,
            })
    }

    /// Files currently in the capture directory, oldest name first
    pub async fn list(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.root.clone(),
                    source,
                })
            }
        };

        let mut files = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|source| StorageError::Io {
                path: self.root.clone(),
                source,
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn extension_for(&self, source: &Path, kind: MediaKind) -> String {
        match kind {
            MediaKind::Photo => self.photo_extension.clone(),
            MediaKind::Video => source
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.fallback_video_extension.clone()),
        }
    }

    /// Timestamp-named target that does not exist yet.
    async fn target_path(&self, extension: &str) -> PathBuf {
        let stamp = Utc::now().timestamp_millis();
        let mut candidate = self.root.join(format!("{}.{}", stamp, extension));
        let mut suffix = 1;
        while tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            candidate = self.root.join(format!("{}-{}.{}", stamp, suffix, extension));
            suffix += 1;
        }
        candidate
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn persist(&self, source: &Path, kind: MediaKind) -> Result<CapturedArtifact, StorageError> {
        self.ensure_directory().await?;

        let extension = self.extension_for(source, kind);
        let target = self.target_path(&extension).await;

        tokio::fs::copy(source, &target)
            .await
            .map_err(|source_err| StorageError::Copy {
                from: source.to_path_buf(),
                to: target.clone(),
                source: source_err,
            })?;

        let metadata = match tokio::fs::metadata(&target).await {
            Ok(m) if m.is_file() => m,
            _ => return Err(StorageError::MissingAfterCopy(target)),
        };

        log::debug!(
            "Persisted {} {} -> {} ({} bytes)",
            kind,
            source.display(),
            target.display(),
            metadata.len()
        );

        Ok(CapturedArtifact {
            uri: target,
            kind,
            size_bytes: Some(metadata.len()),
            created_at: Utc::now(),
        })
    }

    async fn size_of(&self, uri: &Path) -> Result<u64, StorageError> {
        match tokio::fs::metadata(uri).await {
            Ok(m) if m.is_file() => Ok(m.len()),
            Ok(_) => Err(StorageError::NotFound(uri.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(uri.to_path_buf()))
            }
            Err(source) => Err(StorageError::Io {
                path: uri.to_path_buf(),
                source,
            }),
        }
    }

    async fn delete(&self, uri: &Path) -> Result<(), StorageError> {
        match tokio::fs::remove_file(uri).await {
            Ok(()) => {
                log::debug!("Deleted {}", uri.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                path: uri.to_path_buf(),
                source,
            }),
        }
    }
}
