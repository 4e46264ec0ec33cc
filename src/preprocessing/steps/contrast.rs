use crate::error::OcrError;
use image::RgbaImage;

/// Contrast is applied around the mid-gray point so the midpoint is a
/// fixed point of the transform
const MIDPOINT: f32 = 128.0;
/// Divisor mapping the sensitivity offset from 50 onto a contrast factor
const SLOPE_DIVISOR: f32 = 65.0;

/// Contrast amplification factor for a sensitivity value.
/// Sensitivity 50 yields 1.0 (no change); higher sensitivity amplifies.
pub fn factor(sensitivity: u8) -> f32 {
    1.0 + (sensitivity as f32 - 50.0) / SLOPE_DIVISOR
}

/// Scale each color channel away from (or toward) the midpoint by the
/// sensitivity-derived factor, clamped to the valid channel range.
/// Alpha is left untouched.
pub fn apply(mut image: RgbaImage, sensitivity: u8) -> Result<RgbaImage, OcrError> {
    let factor = factor(sensitivity);
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            let boosted = (*channel as f32 - MIDPOINT) * factor + MIDPOINT;
            *channel = boosted.clamp(0.0, 255.0).round() as u8;
        }
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_factor_is_one_at_sensitivity_50() {
        assert_eq!(factor(50), 1.0);
    }

    #[test]
    fn test_factor_grows_with_sensitivity() {
        assert!(factor(100) > factor(50));
        assert!(factor(0) < factor(50));
    }

    #[test]
    fn test_sensitivity_50_leaves_pixels_unchanged() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([73, 180, 129, 255]));
        let result = apply(img.clone(), 50).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_midpoint_is_fixed_for_any_sensitivity() {
        for sensitivity in [0, 25, 50, 75, 100] {
            let img = RgbaImage::from_pixel(1, 1, Rgba([128, 128, 128, 255]));
            let result = apply(img, sensitivity).unwrap();
            assert_eq!(result.get_pixel(0, 0), &Rgba([128, 128, 128, 255]));
        }
    }

    #[test]
    fn test_high_sensitivity_clamps_extremes() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([200, 200, 200, 255]));
        img.put_pixel(1, 0, Rgba([50, 50, 50, 255]));

        // factor(100) = 1 + 50/65, so 200 -> 255.38 and 50 -> -10.0
        let result = apply(img, 100).unwrap();
        assert_eq!(result.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_low_sensitivity_pulls_toward_midpoint() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));

        // factor(0) = 1 - 50/65
        let result = apply(img, 0).unwrap();
        assert_eq!(result.get_pixel(0, 0), &Rgba([98, 98, 98, 255]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([157, 157, 157, 255]));
    }

    #[test]
    fn test_contrast_preserves_alpha() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([40, 210, 90, 42]));
        let result = apply(img, 90).unwrap();
        assert_eq!(result.get_pixel(1, 1).0[3], 42);
    }
}
