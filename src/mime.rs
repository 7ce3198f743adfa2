//! Media type helpers
//!
//! Maps between `image/*` media types and the raster formats this crate can
//! decode and re-encode, and sniffs payloads by their magic bytes.

use image::ImageFormat;

pub const PNG: &str = "image/png";
pub const JPEG: &str = "image/jpeg";
pub const GIF: &str = "image/gif";
pub const WEBP: &str = "image/webp";

/// Sniff a media type from leading bytes. Unknown payloads yield `None`.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some(JPEG),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some(PNG),
        [0x47, 0x49, 0x46, 0x38, ..] => Some(GIF),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some(WEBP),
        _ => {
            tracing::debug!(
                "Unrecognized image signature (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}

/// Resolve a declared media type to a format we can write back out.
///
/// Parameters such as `; charset=...` are ignored and matching is
/// case-insensitive. `image/jpg` is accepted as a common misspelling.
pub fn encodable_format(media_type: &str) -> Option<ImageFormat> {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageFormat::Jpeg),
        "image/gif" => Some(ImageFormat::Gif),
        "image/webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

/// Canonical media type for an encodable format.
pub fn media_type_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some(PNG),
        ImageFormat::Jpeg => Some(JPEG),
        ImageFormat::Gif => Some(GIF),
        ImageFormat::WebP => Some(WEBP),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_png() {
        assert_eq!(
            detect_image_mime(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            Some(PNG)
        );
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(JPEG));
    }

    #[test]
    fn test_detect_gif() {
        assert_eq!(detect_image_mime(b"GIF89a"), Some(GIF));
    }

    #[test]
    fn test_detect_webp() {
        assert_eq!(
            detect_image_mime(&[
                0x52, 0x49, 0x46, 0x46, 0x00, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50
            ]),
            Some(WEBP)
        );
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), None);
        assert_eq!(detect_image_mime(&[]), None);
    }

    #[test]
    fn test_encodable_format_normalizes() {
        assert_eq!(encodable_format("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(encodable_format("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(
            encodable_format("image/webp; q=1"),
            Some(ImageFormat::WebP)
        );
        assert_eq!(encodable_format("image/tiff"), None);
        assert_eq!(encodable_format(""), None);
    }

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(ImageFormat::Gif), Some(GIF));
        assert_eq!(media_type_for(ImageFormat::Bmp), None);
    }
}
