//! CrabShutter: capture session state machine for camera screens
//!
//! This crate drives a camera screen's capture flow: photo and video modes,
//! recording with a minimum dwell time, a preview step with confirm or retake,
//! and per-mode quality presets. The host supplies the camera through the
//! [`device::CaptureDevice`] trait; captured files land in a [`store::MediaStore`].
//!
//! # Features
//! - Photo and video capture with a single shutter intent
//! - Recording stop refused until the dwell time has elapsed
//! - Confirm hands the file off, retake deletes it
//! - Static or device-derived quality presets, applied from the next capture
//! - Snapshots published on a `tokio::sync::watch` channel
//!
//! # Usage
//! ```rust,no_run
//! use crabshutter::session::{CaptureSession, SessionOptions};
//! use crabshutter::store::FsMediaStore;
//! use crabshutter::testing::MockDevice;
//!
//! # async fn run() -> Result<(), crabshutter::CaptureError> {
//! let session = CaptureSession::new(
//!     MockDevice::new("/tmp/crabshutter-device"),
//!     FsMediaStore::new("./captures"),
//!     SessionOptions::default(),
//! );
//! session.shutter().await?;
//! let handoff = session.confirm().await?;
//! println!("captured {} ({} bytes)", handoff.uri.display(), handoff.size_bytes);
//! # Ok(())
//! # }
//! ```
pub mod commands;
pub mod config;
pub mod device;
pub mod errors;
pub mod quality;
pub mod session;
pub mod store;
pub mod timing;
pub mod types;
pub mod upload;

// Testing utilities - synthetic captures and a scriptable device
pub mod testing;

// Re-exports for convenience
pub use config::CrabShutterConfig;
pub use device::CaptureDevice;
pub use errors::{CaptureError, DeviceError, ErrorDescriptor, ErrorKind, Rejection, StorageError};
pub use quality::{QualityCatalog, QualityPreset};
pub use session::{CaptureSession, SessionOptions};
pub use store::{FsMediaStore, MediaStore};
pub use types::{
    CaptureMode, CapturedArtifact, FlashMode, FocusPoint, FocusTap, Handoff, LensFacing,
    MediaKind, RecordingState, SessionSnapshot, Viewport,
};

/// Initialize logging for the capture session
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabshutter=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "crabshutter");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        assert!(std::env::var("RUST_LOG").is_ok());
    }
}
