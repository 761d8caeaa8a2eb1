// Image normalization module
// Decode, conditional aspect-fit downscale, RGB flatten, JPEG encode.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageError};

/// Resize trigger: total pixel count above this forces a downscale
pub const MAX_PIXELS: u64 = 160_000;

/// Neither output dimension may exceed this
pub const TARGET_SIZE: u32 = 400;

/// Fixed JPEG encode quality
pub const JPEG_QUALITY: u8 = 85;

/// Whether an image of the given dimensions must be downscaled
///
/// Note that both dimensions at or under `TARGET_SIZE` bounds the pixel count
/// at exactly `MAX_PIXELS`, so the pixel clause only fires together with a
/// dimension clause; it is kept for clarity of the contract.
pub fn needs_resize(width: u32, height: u32) -> bool {
    u64::from(width) * u64::from(height) > MAX_PIXELS
        || width > TARGET_SIZE
        || height > TARGET_SIZE
}

/// Normalize raw image bytes into bounded RGB JPEG bytes
///
/// Any decodable input format is accepted; animated formats contribute only
/// their first frame. Alpha channels and palettes are flattened to 8-bit RGB.
/// Images already within bounds keep their dimensions, but are still
/// re-encoded as JPEG. The output is deterministic for identical input.
pub fn normalize_to_jpeg(data: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(data)?;

    // Aspect-fit downscale; only reached when at least one dimension exceeds
    // the bound, so this never upscales.
    let img = if needs_resize(img.width(), img.height()) {
        let resized = img.resize(TARGET_SIZE, TARGET_SIZE, FilterType::Lanczos3);
        crate::logger::log_image_resized(resized.width(), resized.height());
        resized
    } else {
        img
    };

    let rgb = img.to_rgb8();

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ExtendedColorType::Rgb8,
    )?;

    Ok(out)
}
