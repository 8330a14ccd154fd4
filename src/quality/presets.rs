//! Quality preset definitions
//!
//! Photo presets bound the saved image's width and JPEG quality; video presets
//! pick one of the recorder resolutions the device understands.

use crate::errors::{CaptureError, DeviceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recorder resolution requested from the device when a recording starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoResolution {
    /// 4:3 sensor crop, smallest files
    FourThree,
    P480,
    P720,
    P1080,
    P2160,
}

impl VideoResolution {
    pub fn id(&self) -> &'static str {
        match self {
            VideoResolution::FourThree => "4:3",
            VideoResolution::P480 => "480p",
            VideoResolution::P720 => "720p",
            VideoResolution::P1080 => "1080p",
            VideoResolution::P2160 => "2160p",
        }
    }

    /// Nominal frame size (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            VideoResolution::FourThree => (640, 480),
            VideoResolution::P480 => (854, 480),
            VideoResolution::P720 => (1280, 720),
            VideoResolution::P1080 => (1920, 1080),
            VideoResolution::P2160 => (3840, 2160),
        }
    }

    /// Recommended bitrate in bits per second
    pub fn bitrate(&self) -> u32 {
        match self {
            VideoResolution::FourThree => 1_000_000,
            VideoResolution::P480 => 1_500_000,
            VideoResolution::P720 => 2_500_000, // 2.5 Mbps for 720p
            VideoResolution::P1080 => 5_000_000,
            VideoResolution::P2160 => 20_000_000,
        }
    }
}

impl FromStr for VideoResolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4:3" => Ok(VideoResolution::FourThree),
            "480p" => Ok(VideoResolution::P480),
            "720p" => Ok(VideoResolution::P720),
            "1080p" => Ok(VideoResolution::P1080),
            "2160p" | "4k" => Ok(VideoResolution::P2160),
            other => Err(format!("unknown video resolution: {}", other)),
        }
    }
}

/// A `WIDTHxHEIGHT` picture size as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PictureSize {
    pub width: u32,
    pub height: u32,
}

impl PictureSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for PictureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for PictureSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once('x')
            .ok_or_else(|| format!("picture size should be WIDTHxHEIGHT, got: {}", s))?;
        let width: u32 = w.parse().map_err(|_| format!("invalid width in {}", s))?;
        let height: u32 = h.parse().map_err(|_| format!("invalid height in {}", s))?;
        if width == 0 || height == 0 {
            return Err(format!("picture size must be non-zero: {}", s));
        }
        Ok(Self { width, height })
    }
}

/// How a preset bounds the captured media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionBound {
    /// Keep whatever the sensor delivers
    Original,
    /// Downscale photos wider than this, preserving aspect ratio
    MaxWidth(u32),
    /// Ask the device for this picture size
    PictureSize(PictureSize),
    Video(VideoResolution),
}

/// Immutable named bundle of resolution and compression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPreset {
    pub id: String,
    pub label: String,
    pub bound: ResolutionBound,
    /// 0.0 (smallest) to 1.0 (no recompression)
    pub compression_quality: f32,
    pub description: String,
    pub icon: String,
}

impl QualityPreset {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        bound: ResolutionBound,
        compression_quality: f32,
        description: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            bound,
            compression_quality: compression_quality.clamp(0.0, 1.0),
            description: description.into(),
            icon: icon.into(),
        }
    }

    /// JPEG encoder quality, 1-100
    pub fn jpeg_quality(&self) -> u8 {
        (self.compression_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Whether a photo taken under this preset is re-encoded before persisting
    pub fn needs_recompression(&self) -> bool {
        self.compression_quality < 1.0 || matches!(self.bound, ResolutionBound::MaxWidth(_))
    }

    pub fn max_width(&self) -> Option<u32> {
        match self.bound {
            ResolutionBound::MaxWidth(w) => Some(w),
            _ => None,
        }
    }

    pub fn picture_size(&self) -> Option<PictureSize> {
        match self.bound {
            ResolutionBound::PictureSize(size) => Some(size),
            _ => None,
        }
    }

    pub fn video_resolution(&self) -> Option<VideoResolution> {
        match self.bound {
            ResolutionBound::Video(res) => Some(res),
            _ => None,
        }
    }
}

/// Built-in photo presets, smallest first.
pub fn photo_presets() -> Vec<QualityPreset> {
    vec![
        QualityPreset::new(
            "low",
            "Low (Small size)",
            ResolutionBound::MaxWidth(640),
            0.4,
            "640px max, 40% quality - fastest to upload",
            "🚀",
        ),
        QualityPreset::new(
            "medium",
            "Medium (Recommended)",
            ResolutionBound::MaxWidth(1024),
            0.6,
            "1024px max, 60% quality - good balance",
            "⚡",
        ),
        QualityPreset::new(
            "high",
            "High (Better details)",
            ResolutionBound::MaxWidth(1600),
            0.8,
            "1600px max, 80% quality - slower to upload",
            "✨",
        ),
        QualityPreset::new(
            "original",
            "Original (No compression)",
            ResolutionBound::Original,
            1.0,
            "Original size and quality - large files",
            "💎",
        ),
    ]
}

/// Built-in video presets, smallest first.
pub fn video_presets() -> Vec<QualityPreset> {
    let preset = |res: VideoResolution, label: &str, description: &str, icon: &str| {
        QualityPreset::new(res.id(), label, ResolutionBound::Video(res), 1.0, description, icon)
    };
    vec![
        preset(
            VideoResolution::FourThree,
            "Very Low",
            "Minimal file size, fastest upload, low clarity",
            "🚀",
        ),
        preset(
            VideoResolution::P480,
            "Low (480p)",
            "Faster upload, basic visibility",
            "📱",
        ),
        preset(
            VideoResolution::P720,
            "Medium (720p)",
            "Good balance of quality and file size",
            "⚡",
        ),
        preset(
            VideoResolution::P1080,
            "High (1080p)",
            "Sharp quality, larger file size",
            "✨",
        ),
        preset(
            VideoResolution::P2160,
            "Ultra (4K)",
            "Best quality, largest file size",
            "💎",
        ),
    ]
}

/// Derive four photo tiers from the picture sizes a device reports.
///
/// Sizes are sorted by area and sampled at the smallest, one third, two
/// thirds and the largest. Unparseable entries are skipped.
pub fn tiered_photo_presets(sizes: &[String]) -> Result<Vec<QualityPreset>, CaptureError> {
    let mut parsed: Vec<PictureSize> = sizes
        .iter()
        .filter_map(|s| match s.parse::<PictureSize>() {
            Ok(size) => Some(size),
            Err(e) => {
                log::warn!("Skipping picture size reported by device: {}", e);
                None
            }
        })
        .collect();

    parsed.sort_by_key(PictureSize::area);

    let tiers = select_tiers(&parsed).ok_or_else(|| {
        CaptureError::from(DeviceError::Unavailable(
            "no picture sizes reported by device".into(),
        ))
    })?;
    let labels: [(&str, &str, f32, &str, &str); 4] = [
        ("low", "Low (Small size)", 0.4, "40% quality - fastest to upload", "🚀"),
        ("medium", "Medium (Recommended)", 0.6, "60% quality - good balance", "⚡"),
        ("high", "High (Better details)", 0.8, "80% quality - slower to upload", "✨"),
        ("original", "Original (No compression)", 1.0, "100% quality - large files", "💎"),
    ];

    Ok(tiers
        .iter()
        .zip(labels.iter())
        .map(|(size, (id, label, quality, tail, icon))| {
            QualityPreset::new(
                *id,
                *label,
                ResolutionBound::PictureSize(*size),
                *quality,
                format!("{} resolution, {}", size, tail),
                *icon,
            )
        })
        .collect())
}

/// Pick four tiers from area-sorted sizes, padding with the largest.
///
/// Returns `None` when there is nothing to pick from.
pub fn select_tiers(sorted: &[PictureSize]) -> Option<[PictureSize; 4]> {
    let total = sorted.len();
    let largest = *sorted.last()?;
    if total < 4 {
        let mut tiers = [largest; 4];
        tiers[..total].copy_from_slice(sorted);
        return Some(tiers);
    }
    Some([
        sorted[0],
        sorted[total / 3],
        sorted[(2 * total) / 3],
        largest,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_presets_are_ordered() {
        let photo = photo_presets();
        let ids: Vec<&str> = photo.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "medium", "high", "original"]);
        assert_eq!(photo[1].max_width(), Some(1024));
        assert_eq!(photo[1].jpeg_quality(), 60);
        assert!(!photo[3].needs_recompression());

        let video = video_presets();
        assert_eq!(video.len(), 5);
        assert_eq!(video[2].video_resolution(), Some(VideoResolution::P720));
    }

    #[test]
    fn test_jpeg_quality_is_clamped() {
        let mut preset = photo_presets().remove(0);
        preset.compression_quality = 0.0;
        assert_eq!(preset.jpeg_quality(), 1);
        preset.compression_quality = 1.0;
        assert_eq!(preset.jpeg_quality(), 100);
    }

    #[test]
    fn test_picture_size_parsing() {
        assert_eq!("1920x1080".parse::<PictureSize>(), Ok(PictureSize::new(1920, 1080)));
        assert!("1920".parse::<PictureSize>().is_err());
        assert!("0x480".parse::<PictureSize>().is_err());
        assert!("axb".parse::<PictureSize>().is_err());
    }

    #[test]
    fn test_tiers_from_many_sizes() {
        let sizes: Vec<String> = ["4000x3000", "640x480", "1280x720", "1920x1080", "320x240", "2560x1440"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let presets = tiered_photo_presets(&sizes).unwrap();
        let bounds: Vec<String> = presets
            .iter()
            .map(|p| p.picture_size().unwrap().to_string())
            .collect();
        // sorted: 320x240, 640x480, 1280x720, 1920x1080, 2560x1440, 4000x3000
        assert_eq!(bounds, vec!["320x240", "1280x720", "2560x1440", "4000x3000"]);
        assert!(presets[0].description.starts_with("320x240 resolution"));
    }

    #[test]
    fn test_tiers_pad_with_largest() {
        let sizes = vec!["1280x720".to_string(), "640x480".to_string()];
        let presets = tiered_photo_presets(&sizes).unwrap();
        let bounds: Vec<PictureSize> = presets.iter().map(|p| p.picture_size().unwrap()).collect();
        assert_eq!(
            bounds,
            vec![
                PictureSize::new(640, 480),
                PictureSize::new(1280, 720),
                PictureSize::new(1280, 720),
                PictureSize::new(1280, 720),
            ]
        );
    }

    #[test]
    fn test_select_tiers_edges() {
        assert_eq!(select_tiers(&[]), None);

        let only = PictureSize::new(800, 600);
        assert_eq!(select_tiers(&[only]), Some([only; 4]));
    }

    #[test]
    fn test_tiers_require_a_size() {
        assert!(tiered_photo_presets(&[]).is_err());
        assert!(tiered_photo_presets(&["garbage".to_string()]).is_err());
    }
}
