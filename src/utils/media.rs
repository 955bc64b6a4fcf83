use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// Identifies an image by its leading bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// MIME type of an image file: content first, extension as fallback.
///
/// Swapped frames keep a `.png` name whatever their real format is, so the
/// name alone can lie.
pub fn image_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    sniff_image_mime(bytes).unwrap_or_else(|| mime_from_extension(path))
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, encode_base64(bytes))
}

/// Decodes a plain base64 string or a `data:` URI.
pub fn decode_base64_payload(payload: &str) -> Result<Vec<u8>> {
    let raw = match payload.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .context("Malformed data URI")?,
        None => payload,
    };
    STANDARD
        .decode(raw.trim())
        .context("Invalid base64 payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const WEBP: &[u8] = b"RIFF\x24\0\0\0WEBPVP8 ";

    #[test]
    fn test_extension_fallback_for_unknown_content() {
        assert_eq!(image_mime_type(Path::new("FRAME/A.webp"), b""), "image/webp");
        assert_eq!(image_mime_type(Path::new("face.JPG"), b"??"), "image/jpeg");
        assert_eq!(image_mime_type(Path::new("face.jpeg"), b""), "image/jpeg");
        assert_eq!(image_mime_type(Path::new("A_swapped.png"), b""), "image/png");
        assert_eq!(image_mime_type(Path::new("noext"), b""), "image/png");
    }

    #[test]
    fn test_content_wins_over_extension() {
        assert_eq!(image_mime_type(Path::new("A_swapped.png"), WEBP), "image/webp");
        assert_eq!(image_mime_type(Path::new("face.png"), JPEG), "image/jpeg");
        assert_eq!(image_mime_type(Path::new("frame.webp"), PNG), "image/png");
    }

    #[test]
    fn test_sniff_rejects_short_or_foreign_data() {
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WAVE"), None);
        assert_eq!(sniff_image_mime(b"RIFF"), None);
        assert_eq!(sniff_image_mime(b"GIF89a"), None);
    }

    #[test]
    fn test_data_uri_decodes_back() -> Result<()> {
        let uri = to_data_uri(b"\x89PNG", "image/png");
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(decode_base64_payload(&uri)?, b"\x89PNG");
        Ok(())
    }

    #[test]
    fn test_decode_plain_and_invalid() {
        assert_eq!(decode_base64_payload("aGk=").unwrap(), b"hi");
        assert!(decode_base64_payload("not base64!!").is_err());
        assert!(decode_base64_payload("data:image/png;base64").is_err());
    }
}
