use super::presets::{photo_presets, video_presets, QualityPreset};
use crate::errors::{CaptureError, Rejection};
use crate::types::CaptureMode;

const DEFAULT_PHOTO_INDEX: usize = 1; // medium
const DEFAULT_VIDEO_INDEX: usize = 2; // 720p

/// Ordered presets per mode with one active preset each.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityCatalog {
    photo: Vec<QualityPreset>,
    video: Vec<QualityPreset>,
    active_photo: usize,
    active_video: usize,
}

impl QualityCatalog {
    /// Built-in presets with medium photo and 720p video active
    pub fn standard() -> Self {
        Self {
            photo: photo_presets(),
            video: video_presets(),
            active_photo: DEFAULT_PHOTO_INDEX,
            active_video: DEFAULT_VIDEO_INDEX,
        }
    }

    pub fn new(photo: Vec<QualityPreset>, video: Vec<QualityPreset>) -> Result<Self, CaptureError> {
        if photo.is_empty() || video.is_empty() {
            return Err(CaptureError::Config(
                "quality catalog needs at least one preset per mode".to_string(),
            ));
        }
        Ok(Self {
            active_photo: DEFAULT_PHOTO_INDEX.min(photo.len() - 1),
            active_video: DEFAULT_VIDEO_INDEX.min(video.len() - 1),
            photo,
            video,
        })
    }

    /// Built-in presets with the given ids active.
    pub fn with_defaults(photo_id: &str, video_id: &str) -> Result<Self, CaptureError> {
        let mut catalog = Self::standard();
        catalog.select(CaptureMode::Photo, photo_id)?;
        catalog.select(CaptureMode::Video, video_id)?;
        Ok(catalog)
    }

    pub fn presets(&self, mode: CaptureMode) -> &[QualityPreset] {
        match mode {
            CaptureMode::Photo => &self.photo,
            CaptureMode::Video => &self.video,
        }
    }

    pub fn active_preset(&self, mode: CaptureMode) -> &QualityPreset {
        match mode {
            CaptureMode::Photo => &self.photo[self.active_photo],
            CaptureMode::Video => &self.video[self.active_video],
        }
    }

    pub fn find(&self, mode: CaptureMode, id: &str) -> Option<&QualityPreset> {
        self.presets(mode).iter().find(|p| p.id == id)
    }

    /// Make `preset` the active one for `mode`. It must belong to the catalog.
    pub fn set_active_preset(
        &mut self,
        mode: CaptureMode,
        preset: &QualityPreset,
    ) -> Result<(), CaptureError> {
        let index = self
            .presets(mode)
            .iter()
            .position(|p| p == preset)
            .ok_or_else(|| Rejection::UnknownPreset {
                mode,
                id: preset.id.clone(),
            })?;
        self.set_index(mode, index);
        Ok(())
    }

    /// Select the active preset for `mode` by id.
    pub fn select(&mut self, mode: CaptureMode, id: &str) -> Result<&QualityPreset, CaptureError> {
        let index = self
            .presets(mode)
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Rejection::UnknownPreset {
                mode,
                id: id.to_string(),
            })?;
        self.set_index(mode, index);
        Ok(self.active_preset(mode))
    }

    /// Swap in device-derived photo presets, keeping the active id when it survives.
    pub fn replace_photo_presets(&mut self, presets: Vec<QualityPreset>) -> Result<(), CaptureError> {
        if presets.is_empty() {
            return Err(CaptureError::Config("no photo presets to install".to_string()));
        }
        let active_id = self.active_preset(CaptureMode::Photo).id.clone();
        self.active_photo = presets
            .iter()
            .position(|p| p.id == active_id)
            .unwrap_or_else(|| DEFAULT_PHOTO_INDEX.min(presets.len() - 1));
        self.photo = presets;
        Ok(())
    }

    fn set_index(&mut self, mode: CaptureMode, index: usize) {
        match mode {
            CaptureMode::Photo => self.active_photo = index,
            CaptureMode::Video => self.active_video = index,
        }
    }
}

impl Default for QualityCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::presets::tiered_photo_presets;

    #[test]
    fn test_standard_defaults() {
        let catalog = QualityCatalog::standard();
        assert_eq!(catalog.active_preset(CaptureMode::Photo).id, "medium");
        assert_eq!(catalog.active_preset(CaptureMode::Video).id, "720p");
    }

    #[test]
    fn test_modes_are_independent() {
        let mut catalog = QualityCatalog::standard();
        catalog.select(CaptureMode::Video, "1080p").unwrap();
        assert_eq!(catalog.active_preset(CaptureMode::Video).id, "1080p");
        assert_eq!(catalog.active_preset(CaptureMode::Photo).id, "medium");
    }

    #[test]
    fn test_set_active_requires_membership() {
        let mut catalog = QualityCatalog::standard();
        let high = catalog.find(CaptureMode::Photo, "high").unwrap().clone();
        catalog.set_active_preset(CaptureMode::Photo, &high).unwrap();
        assert_eq!(catalog.active_preset(CaptureMode::Photo), &high);

        // a photo preset is not a video preset
        let err = catalog.set_active_preset(CaptureMode::Video, &high).unwrap_err();
        assert!(matches!(
            err.rejection(),
            Some(Rejection::UnknownPreset { mode: CaptureMode::Video, .. })
        ));
        assert_eq!(catalog.active_preset(CaptureMode::Video).id, "720p");
    }

    #[test]
    fn test_with_defaults_rejects_unknown_ids() {
        assert!(QualityCatalog::with_defaults("medium", "720p").is_ok());
        assert!(QualityCatalog::with_defaults("ultra", "720p").is_err());
        assert!(QualityCatalog::with_defaults("medium", "8k").is_err());
    }

    #[test]
    fn test_replace_photo_presets_keeps_active_id() {
        let mut catalog = QualityCatalog::standard();
        catalog.select(CaptureMode::Photo, "high").unwrap();

        let sizes = vec!["640x480".to_string(), "1920x1080".to_string(), "4032x3024".to_string()];
        catalog
            .replace_photo_presets(tiered_photo_presets(&sizes).unwrap())
            .unwrap();

        let active = catalog.active_preset(CaptureMode::Photo);
        assert_eq!(active.id, "high");
        assert!(active.picture_size().is_some());
    }

    #[test]
    fn test_new_rejects_empty_lists() {
        assert!(QualityCatalog::new(Vec::new(), video_presets()).is_err());
        let catalog = QualityCatalog::new(photo_presets()[..1].to_vec(), video_presets()).unwrap();
        assert_eq!(catalog.active_preset(CaptureMode::Photo).id, "low");
    }
}
