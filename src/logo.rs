//! Project logo handling: decode an uploaded image, shrink it to fit the
//! logo box, and carry it around base64-encoded as PNG.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::{KanbanError, Result};

/// Maximum logo edge length after resizing.
const MAX_LOGO_EDGE: u32 = 200;

/// Decode raw image bytes, resize to fit 200x200 preserving aspect ratio,
/// and return a `data:image/png;base64,...` string.
pub fn encode(image_bytes: &[u8]) -> Result<String> {
    let decoded = image::load_from_memory(image_bytes)?;
    // `thumbnail` scales in both directions; only shrink, never enlarge.
    let (width, height) = decoded.dimensions();
    let resized = if width <= MAX_LOGO_EDGE && height <= MAX_LOGO_EDGE {
        decoded
    } else {
        decoded.thumbnail(MAX_LOGO_EDGE, MAX_LOGO_EDGE)
    };

    let mut png = Vec::new();
    resized.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(&png)
    ))
}

/// Decode a stored logo string back into an image. Accepts the string with
/// or without the `data:` prefix.
pub fn decode(logo_base64: &str) -> Result<DynamicImage> {
    let payload = match logo_base64.split_once(',') {
        Some((_, data)) => data,
        None => logo_base64,
    };
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| KanbanError::Render(format!("invalid logo encoding: {e}")))?;
    Ok(image::load_from_memory(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 40, 40]),
        ));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn encode_resizes_large_images_into_the_logo_box() {
        let encoded = encode(&sample_png(800, 400)).unwrap();
        assert!(encoded.starts_with("data:image/png;base64,"));

        let round_tripped = decode(&encoded).unwrap();
        let (w, h) = round_tripped.dimensions();
        assert!(w <= MAX_LOGO_EDGE && h <= MAX_LOGO_EDGE);
        // Aspect ratio preserved: 2:1 input stays 2:1.
        assert_eq!(w, 200);
        assert_eq!(h, 100);
    }

    #[test]
    fn small_images_are_not_upscaled() {
        let encoded = encode(&sample_png(50, 40)).unwrap();
        let round_tripped = decode(&encoded).unwrap();
        assert_eq!(round_tripped.dimensions(), (50, 40));
    }

    #[test]
    fn decode_accepts_bare_base64_without_prefix() {
        let bytes = sample_png(10, 10);
        let bare = STANDARD.encode(&bytes);
        assert!(decode(&bare).is_ok());
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(encode(b"definitely not an image").is_err());
        assert!(decode("data:image/png;base64,@@@").is_err());
    }
}
