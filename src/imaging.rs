//! Reference image helpers: data URL handling and aspect ratio detection.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::upstream::types::AspectRatio;

/// Strip a `data:image/...;base64,` prefix. The vendor expects bare base64.
pub fn strip_data_url(image: &str) -> &str {
    if image.starts_with("data:") {
        if let Some(idx) = image.find(";base64,") {
            return &image[idx + ";base64,".len()..];
        }
    }
    image
}

/// Base64-encode raw image bytes for submission.
pub fn encode_image(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Pixel dimensions of an encoded image, if the format is recognised.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Detect the supported aspect ratio of a base64 image.
///
/// Returns `None` when the payload does not decode or its ratio is not one
/// the vendor accepts.
pub fn detect_aspect_ratio(image_base64: &str) -> Option<AspectRatio> {
    let bytes = BASE64.decode(strip_data_url(image_base64).trim()).ok()?;
    let (width, height) = image_dimensions(&bytes)?;
    AspectRatio::from_dimensions(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_strip_data_url() {
        assert_eq!(strip_data_url("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url("data:image/jpeg;base64,BBBB"), "BBBB");
        assert_eq!(strip_data_url("AAAA"), "AAAA");
        assert_eq!(strip_data_url("data:text/plain,hello"), "data:text/plain,hello");
    }

    #[test]
    fn test_detects_widescreen_png() {
        let encoded = encode_image(&png(160, 90));
        assert_eq!(detect_aspect_ratio(&encoded), Some(AspectRatio::Widescreen));

        let with_prefix = format!("data:image/png;base64,{}", encoded);
        assert_eq!(detect_aspect_ratio(&with_prefix), Some(AspectRatio::Widescreen));
    }

    #[test]
    fn test_unsupported_ratio_or_garbage() {
        assert_eq!(detect_aspect_ratio(&encode_image(&png(100, 37))), None);
        assert_eq!(detect_aspect_ratio("not base64!"), None);
        assert_eq!(detect_aspect_ratio(&encode_image(b"plain text")), None);
    }
}
