//! Core value types shared by the session, the device seam and the store.

use crate::errors::ErrorDescriptor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What the shutter does: take a still or toggle a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    #[default]
    Photo,
    Video,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMode::Photo => "photo",
            CaptureMode::Video => "video",
        }
    }

    /// Kind of artifact a capture in this mode produces
    pub fn media_kind(&self) -> MediaKind {
        match self {
            CaptureMode::Photo => MediaKind::Photo,
            CaptureMode::Video => MediaKind::Video,
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "photo" | "picture" => Ok(CaptureMode::Photo),
            "video" => Ok(CaptureMode::Video),
            other => Err(format!("unknown capture mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recording sub-state while the session is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    /// Start command issued, device confirmation outstanding
    Arming,
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
}

impl FlashMode {
    /// Cycle order used by the flash button: off, on, auto, off.
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    #[default]
    Back,
    Front,
}

impl LensFacing {
    pub fn toggled(self) -> Self {
        match self {
            LensFacing::Back => LensFacing::Front,
            LensFacing::Front => LensFacing::Back,
        }
    }
}

/// Size of the preview surface the focus tap was made on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Focus target in preview coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusPoint {
    pub x: f32,
    pub y: f32,
}

impl FocusPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Clamp a tap into `[margin, extent - margin]` on both axes.
    ///
    /// On a viewport narrower than two margins the point pins to `margin`.
    pub fn clamped(x: f32, y: f32, viewport: Viewport, margin: f32) -> Self {
        let clamp = |v: f32, extent: f32| margin.max(v.min(extent - margin));
        Self {
            x: clamp(x, viewport.width),
            y: clamp(y, viewport.height),
        }
    }
}

/// Where a tap landed and how long the preview should show the focus ring there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusTap {
    pub point: FocusPoint,
    pub indicator_ms: u64,
}

/// A captured photo or video file held by the session until confirm or retake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedArtifact {
    pub uri: PathBuf,
    pub kind: MediaKind,
    pub size_bytes: Option<u64>,
    pub created_at: DateTime<Utc>,
}

/// What the caller receives when an artifact is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub uri: PathBuf,
    pub kind: MediaKind,
    pub size_bytes: u64,
}

/// Session state published to the presentation layer after every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: CaptureMode,
    pub recording: RecordingState,
    pub elapsed_secs: u64,
    pub pending: Option<CapturedArtifact>,
    pub flash: FlashMode,
    pub lens: LensFacing,
    pub busy: bool,
    pub closed: bool,
    pub photo_preset: String,
    pub video_preset: String,
    pub error: Option<ErrorDescriptor>,
}

impl SessionSnapshot {
    /// Elapsed recording time as `m:ss`
    pub fn elapsed_label(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }
}

pub fn format_elapsed(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_cycle() {
        let mut flash = FlashMode::default();
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(flash);
            flash = flash.next();
        }
        assert_eq!(
            seen,
            vec![FlashMode::Off, FlashMode::On, FlashMode::Auto, FlashMode::Off]
        );
    }

    #[test]
    fn test_lens_toggle() {
        assert_eq!(LensFacing::Back.toggled(), LensFacing::Front);
        assert_eq!(LensFacing::Front.toggled().toggled(), LensFacing::Front);
    }

    #[test]
    fn test_focus_point_clamping() {
        let viewport = Viewport::new(400.0, 800.0);
        let inside = FocusPoint::clamped(200.0, 300.0, viewport, 50.0);
        assert_eq!(inside, FocusPoint::new(200.0, 300.0));

        let corner = FocusPoint::clamped(-10.0, 900.0, viewport, 50.0);
        assert_eq!(corner, FocusPoint::new(50.0, 750.0));

        let tiny = FocusPoint::clamped(30.0, 30.0, Viewport::new(60.0, 60.0), 50.0);
        assert_eq!(tiny, FocusPoint::new(50.0, 50.0));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Photo".parse::<CaptureMode>(), Ok(CaptureMode::Photo));
        assert_eq!("video".parse::<CaptureMode>(), Ok(CaptureMode::Video));
        assert!("panorama".parse::<CaptureMode>().is_err());
        assert_eq!(CaptureMode::Video.media_kind(), MediaKind::Video);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(9), "0:09");
        assert_eq!(format_elapsed(75), "1:15");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&CaptureMode::Video).unwrap();
        assert_eq!(json, "\"video\"");
        let kind: MediaKind = serde_json::from_str("\"photo\"").unwrap();
        assert_eq!(kind, MediaKind::Photo);
    }
}
