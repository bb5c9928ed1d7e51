//! Image encoding: `SourceImage` → base64 PNG wrapped in `ImageData`.
//!
//! VLM APIs accept images as base64 data embedded in the JSON request body.
//! Photos that fit within `max_image_pixels` are sent as-is in their
//! original encoding; larger ones are downscaled and re-encoded as PNG
//! (lossless, so price tags and fine print keep sharp edges).

use super::input::SourceImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Dimensions after fitting the longest edge into `max_edge`, aspect kept.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_edge || longest == 0 {
        return (width, height);
    }
    let scale = max_edge as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Encode a photograph for the vision model.
pub fn encode_image(image: &SourceImage, max_edge: u32) -> Result<ImageData, image::ImageError> {
    let (w, h) = fit_within(image.width, image.height, max_edge);

    let (b64, mime) = if (w, h) == (image.width, image.height) {
        (STANDARD.encode(&image.bytes), image.mime_type())
    } else {
        let decoded = image::load_from_memory_with_format(&image.bytes, image.format)?;
        let resized = decoded.resize(w, h, FilterType::Lanczos3);
        (STANDARD.encode(png_bytes(&resized)?), "image/png")
    };

    debug!(
        "Encoded image {} ({}x{} → {}x{}) → {} bytes base64",
        image.image_num,
        image.width,
        image.height,
        w,
        h,
        b64.len()
    );

    Ok(ImageData::new(b64, mime).with_detail("high"))
}

fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
