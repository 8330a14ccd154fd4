//! Upload hand-off
//!
//! Confirmed captures leave the session as a [`Handoff`]. Uploading is the
//! host's business; only a simulated uploader ships here.

use crate::types::{Handoff, MediaKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no media to upload at {0}")]
    MissingMedia(PathBuf),
    #[error("upload failed: {0}")]
    Failed(String),
}

/// Proof that a capture left the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub uri: PathBuf,
    pub kind: MediaKind,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, handoff: &Handoff) -> Result<UploadReceipt, UploadError>;
}

#[async_trait]
impl<T: Uploader + ?Sized> Uploader for Arc<T> {
    async fn upload(&self, handoff: &Handoff) -> Result<UploadReceipt, UploadError> {
        (**self).upload(handoff).await
    }
}

/// Waits a fixed delay and reports success. The file is left in place.
#[derive(Debug, Clone)]
pub struct SimulatedUploader {
    delay: Duration,
}

impl SimulatedUploader {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedUploader {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

#[async_trait]
impl Uploader for SimulatedUploader {
    async fn upload(&self, handoff: &Handoff) -> Result<UploadReceipt, UploadError> {
        if !tokio::fs::try_exists(&handoff.uri).await.unwrap_or(false) {
            return Err(UploadError::MissingMedia(handoff.uri.clone()));
        }

        log::info!("Uploading {} {}...", handoff.kind, handoff.uri.display());
        tokio::time::sleep(self.delay).await;

        Ok(UploadReceipt {
            uri: handoff.uri.clone(),
            kind: handoff.kind,
            size_bytes: handoff.size_bytes,
            uploaded_at: Utc::now(),
        })
    }
}
