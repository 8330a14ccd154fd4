use crate::types::CaptureMode;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by the host camera device.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device unavailable: {0}")]
    Unavailable(String),
    #[error("photo capture failed: {0}")]
    Capture(String),
    #[error("recording failed: {0}")]
    Recording(String),
    #[error("control rejected: {0}")]
    Control(String),
}

/// Failure reported by the media store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create capture directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("persisted file missing after copy: {0}")]
    MissingAfterCopy(PathBuf),
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image processing failed for {path}: {message}")]
    Image { path: PathBuf, message: String },
}

/// Intent refused synchronously; the session state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("a device call is still outstanding")]
    Busy,
    #[error("recording too short to stop: {elapsed_ms}ms of {required_ms}ms")]
    DwellTime { elapsed_ms: u64, required_ms: u64 },
    #[error("a captured artifact is waiting for confirm or retake")]
    PreviewPending,
    #[error("no captured artifact is pending")]
    NothingPending,
    #[error("session is closed")]
    Closed,
    #[error("unknown {mode} preset: {id}")]
    UnknownPreset { mode: CaptureMode, id: String },
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("configuration error: {0}")]
    Config(String),
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::Device(_) => ErrorKind::Device,
            CaptureError::Storage(_) => ErrorKind::Storage,
            CaptureError::Rejected(_) => ErrorKind::Rejected,
            CaptureError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn descriptor(&self) -> ErrorDescriptor {
        ErrorDescriptor {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    /// Returns the rejection reason when the intent was refused outright.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            CaptureError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Device,
    Storage,
    Rejected,
    Config,
}

/// Transient error signal attached to a published snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub message: String,
}

impl std::fmt::Display for ErrorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_variant() {
        let device: CaptureError = DeviceError::Capture("shutter jammed".into()).into();
        assert_eq!(device.kind(), ErrorKind::Device);

        let storage: CaptureError = StorageError::NotFound(PathBuf::from("/nope.jpg")).into();
        assert_eq!(storage.kind(), ErrorKind::Storage);

        let rejected: CaptureError = Rejection::Busy.into();
        assert_eq!(rejected.kind(), ErrorKind::Rejected);
        assert_eq!(rejected.rejection(), Some(&Rejection::Busy));
    }

    #[test]
    fn test_descriptor_carries_message() {
        let err: CaptureError = Rejection::DwellTime {
            elapsed_ms: 400,
            required_ms: 1000,
        }
        .into();
        let descriptor = err.descriptor();
        assert_eq!(descriptor.kind, ErrorKind::Rejected);
        assert!(descriptor.message.contains("400ms of 1000ms"));
    }

    #[test]
    fn test_storage_error_exposes_source() {
        use std::error::Error;
        let err = StorageError::Io {
            path: PathBuf::from("/captures/1.jpg"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/captures/1.jpg"));
    }
}
