//! Quality catalog
//!
//! Capture presets selectable per mode, either built in or derived from the
//! picture sizes the device reports.
pub mod catalog;
pub mod presets;

pub use catalog::QualityCatalog;
pub use presets::{
    photo_presets, select_tiers, tiered_photo_presets, video_presets, PictureSize, QualityPreset,
    ResolutionBound, VideoResolution,
};
