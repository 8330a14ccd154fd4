//! Photo recompression before persisting
//!
//! Decoding, resizing and JPEG encoding are all done by the `image` crate on
//! the blocking pool.

use crate::errors::StorageError;
use crate::quality::QualityPreset;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Re-encode `source` under `preset` into a staged JPEG in `staging_dir`.
///
/// Returns `Ok(None)` when the preset keeps the original bytes.
pub async fn compress_photo(
    source: &Path,
    preset: &QualityPreset,
    staging_dir: &Path,
) -> Result<Option<PathBuf>, StorageError> {
    if !preset.needs_recompression() {
        return Ok(None);
    }

    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(|source| StorageError::CreateDirectory {
            path: staging_dir.to_path_buf(),
            source,
        })?;

    let target = staging_dir.join(format!("{}.jpg", uuid::Uuid::new_v4()));
    let source_path = source.to_path_buf();
    let target_path = target.clone();
    let max_width = preset.max_width();
    let quality = preset.jpeg_quality();

    tokio::task::spawn_blocking(move || encode(&source_path, &target_path, max_width, quality))
        .await
        .map_err(|e| StorageError::Image {
            path: source.to_path_buf(),
            message: format!("compression task failed: {}", e),
        })??;

    log::debug!(
        "Compressed {} with preset {} (q={}) -> {}",
        source.display(),
        preset.id,
        quality,
        target.display()
    );
    Ok(Some(target))
}

fn encode(source: &Path, target: &Path, max_width: Option<u32>, quality: u8) -> Result<(), StorageError> {
    let image_error = |message: String| StorageError::Image {
        path: source.to_path_buf(),
        message,
    };

    let img = image::open(source).map_err(|e| image_error(e.to_string()))?;
    let img = fit_width(img, max_width);
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let file = File::create(target).map_err(|source| StorageError::Io {
        path: target.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| image_error(e.to_string()))?;
    writer.flush().map_err(|source| StorageError::Io {
        path: target.to_path_buf(),
        source,
    })
}

/// Downscale to `max_width` keeping the aspect ratio; never upscales.
pub fn fit_width(img: DynamicImage, max_width: Option<u32>) -> DynamicImage {
    match max_width {
        Some(max) if max > 0 && img.width() > max => {
            let height = (img.height() as u64 * max as u64 / img.width() as u64).max(1) as u32;
            img.resize_exact(max, height, FilterType::Triangle)
        }
        _ => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::photo_presets;
    use crate::testing::synthetic_jpeg;
    use tempfile::tempdir;

    fn preset(id: &str) -> QualityPreset {
        photo_presets().into_iter().find(|p| p.id == id).unwrap()
    }

    #[tokio::test]
    async fn test_original_preset_is_passthrough() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("raw.jpg");
        std::fs::write(&source, synthetic_jpeg(64, 48, 90).unwrap()).unwrap();

        let staged = compress_photo(&source, &preset("original"), dir.path())
            .await
            .unwrap();
        assert!(staged.is_none());
    }

    #[tokio::test]
    async fn test_downscales_wide_photos() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("raw.jpg");
        std::fs::write(&source, synthetic_jpeg(1280, 960, 95).unwrap()).unwrap();

        let staged = compress_photo(&source, &preset("low"), &dir.path().join("staging"))
            .await
            .unwrap()
            .expect("low preset recompresses");

        let img = image::open(&staged).unwrap();
        assert_eq!((img.width(), img.height()), (640, 480));
    }

    #[tokio::test]
    async fn test_narrow_photos_are_not_upscaled() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("raw.jpg");
        std::fs::write(&source, synthetic_jpeg(320, 240, 95).unwrap()).unwrap();

        let staged = compress_photo(&source, &preset("medium"), dir.path())
            .await
            .unwrap()
            .unwrap();
        let img = image::open(&staged).unwrap();
        assert_eq!((img.width(), img.height()), (320, 240));
    }

    #[tokio::test]
    async fn test_undecodable_source_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("raw.jpg");
        std::fs::write(&source, b"not an image").unwrap();

        let err = compress_photo(&source, &preset("medium"), dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Image { .. }));
    }

    #[test]
    fn test_fit_width_keeps_aspect() {
        let img = DynamicImage::new_rgb8(4000, 3000);
        let fitted = fit_width(img, Some(1600));
        assert_eq!((fitted.width(), fitted.height()), (1600, 1200));
    }
}
