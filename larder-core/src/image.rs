//! Image validation and transport encoding.
//!
//! Receipt photos are validated by magic bytes only; nothing here decodes pixels.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, ImageReader};

use crate::ai::ImageData;
use crate::error::AiError;

/// Allowed image formats for receipt photos.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum file size for images (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Validate image data: check format is allowed and detect content type.
///
/// Returns the content type on success (e.g., "image/jpeg").
pub fn validate_image(data: &[u8]) -> Result<String, String> {
    if data.is_empty() {
        return Err("Image is empty".to_string());
    }

    if data.len() > MAX_FILE_SIZE {
        return Err(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            MAX_FILE_SIZE
        ));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let format = reader
        .format()
        .ok_or_else(|| "Could not detect image format".to_string())?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    Ok(format.to_mime_type().to_string())
}

/// Validate raw image bytes and base64-encode them for the generator.
pub fn encode_image(data: &[u8]) -> Result<ImageData, AiError> {
    let mime_type = validate_image(data).map_err(AiError::MalformedImage)?;

    Ok(ImageData {
        mime_type,
        data: STANDARD.encode(data),
    })
}

/// Decode a data URI (`data:image/png;base64,...`) or a bare base64 string.
pub fn decode_image(encoded: &str) -> Result<Vec<u8>, AiError> {
    let encoded = encoded.trim();
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                AiError::MalformedImage("data URI has no payload".to_string())
            })?;
            if !header.ends_with(";base64") {
                return Err(AiError::MalformedImage(
                    "data URI is not base64-encoded".to_string(),
                ));
            }
            payload
        }
        None => encoded,
    };

    STANDARD
        .decode(payload)
        .map_err(|e| AiError::MalformedImage(format!("invalid base64: {}", e)))
}

/// Parse an image string received over the wire into validated [`ImageData`].
pub fn parse_encoded_image(encoded: &str) -> Result<ImageData, AiError> {
    let bytes = decode_image(encoded)?;
    encode_image(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_validate_png() {
        assert_eq!(validate_image(PNG_SIGNATURE).unwrap(), "image/png");
    }

    #[test]
    fn test_validate_invalid_format() {
        let invalid_data = b"not an image";
        let result = validate_image(invalid_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_disallowed_format() {
        let bmp = b"BM\0\0\0\0\0\0\0\0\0\0\0\0\0\0";
        let err = validate_image(bmp).unwrap_err();
        assert!(err.contains("Unsupported"), "{}", err);
    }

    #[test]
    fn test_encode_rejects_empty() {
        assert!(matches!(encode_image(&[]), Err(AiError::MalformedImage(_))));
    }

    #[test]
    fn test_data_uri_roundtrip() {
        let encoded = encode_image(PNG_SIGNATURE).unwrap();
        let parsed = parse_encoded_image(&encoded.to_data_uri()).unwrap();
        assert_eq!(parsed, encoded);

        let bare = parse_encoded_image(&encoded.data).unwrap();
        assert_eq!(bare.mime_type, "image/png");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_image("data:image/png;base64").is_err());
        assert!(decode_image("data:text/plain,hello").is_err());
        assert!(decode_image("!!!").is_err());
    }
}
