//! Capture device seam
//!
//! The host platform owns the camera. The session only needs the primitives
//! below; everything else (preview surface, permissions) stays with the host.

use crate::errors::DeviceError;
use crate::quality::{PictureSize, QualityPreset, VideoResolution};
use crate::types::{FlashMode, FocusPoint, LensFacing};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Parameters for a still capture
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhotoRequest {
    /// Requested sensor picture size; `None` lets the device choose
    pub picture_size: Option<PictureSize>,
}

impl PhotoRequest {
    pub fn for_preset(preset: &QualityPreset) -> Self {
        Self {
            picture_size: preset.picture_size(),
        }
    }
}

/// Parameters for a recording, fixed when the recording starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRequest {
    pub preset_id: String,
    pub resolution: VideoResolution,
    pub width: u32,
    pub height: u32,
    pub bitrate: u32,
}

impl VideoRequest {
    /// Presets without a video resolution fall back to 720p
    pub fn for_preset(preset: &QualityPreset) -> Self {
        let resolution = preset.video_resolution().unwrap_or(VideoResolution::P720);
        let (width, height) = resolution.dimensions();
        Self {
            preset_id: preset.id.clone(),
            resolution,
            width,
            height,
            bitrate: resolution.bitrate(),
        }
    }
}

/// Temporary file produced by the device; the media store copies it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapture {
    pub path: PathBuf,
}

impl RawCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn take_photo(&self, request: &PhotoRequest) -> Result<RawCapture, DeviceError>;

    /// Resolves once the device has confirmed the recording is running.
    async fn start_recording(&self, request: &VideoRequest) -> Result<(), DeviceError>;

    /// Stops the running recording. `Ok(None)` means the device produced
    /// nothing usable.
    async fn stop_recording(&self) -> Result<Option<RawCapture>, DeviceError>;

    async fn set_flash(&self, mode: FlashMode) -> Result<(), DeviceError>;

    async fn set_lens(&self, lens: LensFacing) -> Result<(), DeviceError>;

    async fn set_focus_point(&self, point: FocusPoint) -> Result<(), DeviceError>;

    /// Picture sizes as `WIDTHxHEIGHT` strings
    async fn picture_sizes(&self) -> Result<Vec<String>, DeviceError>;
}

#[async_trait]
impl<T: CaptureDevice + ?Sized> CaptureDevice for Arc<T> {
    async fn take_photo(&self, request: &PhotoRequest) -> Result<RawCapture, DeviceError> {
        (**self).take_photo(request).await
    }

    async fn start_recording(&self, request: &VideoRequest) -> Result<(), DeviceError> {
        (**self).start_recording(request).await
    }

    async fn stop_recording(&self) -> Result<Option<RawCapture>, DeviceError> {
        (**self).stop_recording().await
    }

    async fn set_flash(&self, mode: FlashMode) -> Result<(), DeviceError> {
        (**self).set_flash(mode).await
    }

    async fn set_lens(&self, lens: LensFacing) -> Result<(), DeviceError> {
        (**self).set_lens(lens).await
    }

    async fn set_focus_point(&self, point: FocusPoint) -> Result<(), DeviceError> {
        (**self).set_focus_point(point).await
    }

    async fn picture_sizes(&self) -> Result<Vec<String>, DeviceError> {
        (**self).picture_sizes().await
    }
}
