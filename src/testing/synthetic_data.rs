//! Synthetic capture payloads

use image::codecs::jpeg::JpegEncoder;
use image::{ImageError, RgbImage};

/// Gradient test pattern so encoders have real content to work with
pub fn synthetic_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x + y) % 256) as u8,
        ])
    })
}

/// Encode the test pattern as a JPEG
pub fn synthetic_jpeg(width: u32, height: u32, quality: u8) -> Result<Vec<u8>, ImageError> {
    let img = synthetic_rgb(width, height);
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    img.write_with_encoder(encoder)?;
    Ok(bytes)
}

/// Placeholder container bytes standing in for a recorded clip.
///
/// Starts with an ISO BMFF `ftyp` box; the rest is filler sized by duration.
pub fn synthetic_video_bytes(duration_ms: u64) -> Vec<u8> {
    let mut bytes = vec![0x00, 0x00, 0x00, 0x18];
    bytes.extend_from_slice(b"ftypisom");
    bytes.extend_from_slice(&[0x00, 0x00, 0x02, 0x00]);
    bytes.extend_from_slice(b"isomiso2");
    let filler = (duration_ms / 10).max(1) as usize * 16;
    bytes.extend((0..filler).map(|i| (i % 251) as u8));
    bytes
}
