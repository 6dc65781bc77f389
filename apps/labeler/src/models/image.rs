//! Nutrition-facts image — data-URI decode and dimension probing.
//!
//! The image arrives from the form as a `data:image/...;base64,` URI and is
//! stored verbatim on the label. Decoding happens once per layout run; a
//! malformed image is reported as `LabelError::ImageDecode` and the caller
//! skips the image block rather than aborting the layout.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::errors::LabelError;

/// A decoded nutrition image: raw encoded bytes plus pixel dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NutritionImage {
    /// Decodes a `data:image/...;base64,` URI.
    ///
    /// The payload is base64-decoded and the header probed for pixel
    /// dimensions; the pixels themselves are not decoded here (the renderer
    /// owns rasterization).
    pub fn from_data_uri(uri: &str) -> Result<NutritionImage, LabelError> {
        let payload = uri
            .split_once("base64,")
            .map(|(_, rest)| rest)
            .ok_or_else(|| LabelError::ImageDecode("not a base64 data URI".to_string()))?;

        let bytes = BASE64
            .decode(payload.trim())
            .map_err(|e| LabelError::ImageDecode(format!("base64: {e}")))?;

        let (width, height) = image::io::Reader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| LabelError::ImageDecode(format!("format probe: {e}")))?
            .into_dimensions()
            .map_err(|e| LabelError::ImageDecode(format!("dimensions: {e}")))?;

        if width == 0 || height == 0 {
            return Err(LabelError::ImageDecode("degenerate image dimensions".to_string()));
        }

        Ok(NutritionImage { bytes, width, height })
    }

    /// Width/height ratio, used by contain-fit placement.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest valid 1×1 PNG (89 bytes), the classic transparent pixel.
    const ONE_PX_PNG: &str = "data:image/png;base64,\
iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_decodes_png_data_uri() {
        let img = NutritionImage::from_data_uri(ONE_PX_PNG).expect("valid data URI");
        assert_eq!((img.width, img.height), (1, 1));
        assert!(!img.bytes.is_empty());
    }

    #[test]
    fn test_rejects_non_data_uri() {
        let err = NutritionImage::from_data_uri("/tmp/nutrition.png").unwrap_err();
        assert!(matches!(err, LabelError::ImageDecode(_)));
    }

    #[test]
    fn test_rejects_malformed_base64() {
        let err = NutritionImage::from_data_uri("data:image/png;base64,!!!not-base64!!!").unwrap_err();
        assert!(matches!(err, LabelError::ImageDecode(_)));
    }

    #[test]
    fn test_rejects_garbage_payload() {
        // Valid base64, not an image.
        let uri = format!("data:image/png;base64,{}", BASE64.encode(b"hello world"));
        let err = NutritionImage::from_data_uri(&uri).unwrap_err();
        assert!(matches!(err, LabelError::ImageDecode(_)));
    }
}
