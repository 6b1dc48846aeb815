//! Base64 encoding of uploads for multimodal request bodies and previews.
//!
//! Vision APIs accept images inline as base64 inside the JSON body. The same
//! encoding backs the `originalFilePreview` data URL returned to the client.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Plain base64 of the payload bytes.
pub fn to_base64(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    b64
}

/// `data:<media_type>;base64,<...>` for inline previews.
pub fn data_url(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, to_base64(bytes))
}

/// Wrap an image for an edgequake-llm vision message.
///
/// `detail: "high"` asks GPT-4-class models for the full tile budget; small
/// print in scanned documents is lost at the low setting.
pub fn image_data(media_type: &str, bytes: &[u8]) -> ImageData {
    ImageData::new(to_base64(bytes), media_type).with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_prefix() {
        let url = data_url("image/png", b"abc");
        assert_eq!(url, "data:image/png;base64,YWJj");
    }

    #[test]
    fn image_data_round_trips() {
        let data = image_data("image/jpeg", &[0xFF, 0xD8, 0xFF]);
        assert_eq!(data.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), vec![0xFF, 0xD8, 0xFF]);
    }
}
