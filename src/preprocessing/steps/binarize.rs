use crate::error::OcrError;
use image::RgbaImage;

/// Threshold at sensitivity 0
const THRESHOLD_BASE: f32 = 168.0;
/// Threshold drop per sensitivity unit
const THRESHOLD_SLOPE: f32 = 0.85;
/// Threshold clamp bounds
const THRESHOLD_MIN: f32 = 80.0;
const THRESHOLD_MAX: f32 = 190.0;

/// Binarization threshold for a sensitivity value.
/// Higher sensitivity lowers the threshold, classifying more pixels as
/// foreground (white).
pub fn threshold(sensitivity: u8) -> f32 {
    (THRESHOLD_BASE - sensitivity as f32 * THRESHOLD_SLOPE).clamp(THRESHOLD_MIN, THRESHOLD_MAX)
}

/// Force each color channel to pure white or pure black depending on
/// whether it reaches the sensitivity-derived threshold.
/// Alpha is left untouched.
pub fn apply(mut image: RgbaImage, sensitivity: u8) -> Result<RgbaImage, OcrError> {
    let threshold = threshold(sensitivity);
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = if *channel as f32 >= threshold { 255 } else { 0 };
        }
    }
    Ok(image)
}
