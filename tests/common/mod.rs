//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use crabshutter::errors::StorageError;
use crabshutter::session::{CaptureSession, SessionOptions};
use crabshutter::store::{FsMediaStore, MediaStore};
use crabshutter::testing::MockDevice;
use crabshutter::{CaptureMode, CapturedArtifact, MediaKind};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Filesystem store that can be told to fail and records deletions
#[derive(Debug)]
pub struct FlakyStore {
    inner: FsMediaStore,
    pub fail_persist: AtomicBool,
    pub fail_delete: AtomicBool,
    deletes: Mutex<Vec<PathBuf>>,
}

impl FlakyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: FsMediaStore::new(root),
            fail_persist: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            deletes: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        self.inner.root()
    }

    pub fn deletes(&self) -> Vec<PathBuf> {
        self.deletes.lock().unwrap().clone()
    }

    pub async fn files(&self) -> Vec<PathBuf> {
        self.inner.list().await.unwrap()
    }
}

#[async_trait]
impl MediaStore for FlakyStore {
    async fn persist(&self, source: &Path, kind: MediaKind) -> Result<CapturedArtifact, StorageError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(StorageError::MissingAfterCopy(self.inner.root().join("lost")));
        }
        self.inner.persist(source, kind).await
    }

    async fn size_of(&self, uri: &Path) -> Result<u64, StorageError> {
        self.inner.size_of(uri).await
    }

    async fn delete(&self, uri: &Path) -> Result<(), StorageError> {
        self.deletes.lock().unwrap().push(uri.to_path_buf());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: uri.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"),
            });
        }
        self.inner.delete(uri).await
    }
}

pub type Session = CaptureSession<Arc<MockDevice>, Arc<FlakyStore>>;

pub struct Fixture {
    pub dir: TempDir,
    pub device: Arc<MockDevice>,
    pub store: Arc<FlakyStore>,
    pub session: Session,
}

pub fn fixture(mode: CaptureMode) -> Fixture {
    fixture_with(SessionOptions {
        default_mode: mode,
        ..SessionOptions::default()
    })
}

pub fn fixture_with(options: SessionOptions) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let device = Arc::new(MockDevice::new(dir.path().join("device")));
    let store = Arc::new(FlakyStore::new(dir.path().join("captures")));
    let options = SessionOptions {
        staging_dir: dir.path().join("staging"),
        ..options
    };
    let session = CaptureSession::new(device.clone(), store.clone(), options);
    Fixture {
        dir,
        device,
        store,
        session,
    }
}

/// Files the device left in its scratch directory
pub fn scratch_files(fixture: &Fixture) -> Vec<PathBuf> {
    match std::fs::read_dir(fixture.device.dir()) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}
