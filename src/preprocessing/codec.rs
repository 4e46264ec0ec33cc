use crate::error::OcrError;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Decode an encoded image buffer into an RGBA pixel grid
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, OcrError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| OcrError::ImageDecodeError(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Encode an RGBA pixel grid as PNG, a lossless format every engine accepts
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, OcrError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| OcrError::ImageEncodeError(e.to_string()))?;
    Ok(bytes)
}
