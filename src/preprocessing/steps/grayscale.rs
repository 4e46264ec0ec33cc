use crate::error::OcrError;
use image::RgbaImage;

/// Rec. 601 luma weights
const R_WEIGHT: f32 = 0.299;
const G_WEIGHT: f32 = 0.587;
const B_WEIGHT: f32 = 0.114;

/// Replace each pixel's color channels with its perceptual luminance.
/// Alpha is left untouched.
pub fn apply(mut image: RgbaImage) -> Result<RgbaImage, OcrError> {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let gray = (R_WEIGHT * r as f32 + G_WEIGHT * g as f32 + B_WEIGHT * b as f32).round() as u8;
        pixel.0[0] = gray;
        pixel.0[1] = gray;
        pixel.0[2] = gray;
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_grayscale_uses_luma_weights() {
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img.put_pixel(2, 0, Rgba([0, 0, 255, 255]));

        let result = apply(img).unwrap();

        // 0.299 * 255, 0.587 * 255, 0.114 * 255, rounded
        assert_eq!(result.get_pixel(0, 0), &Rgba([76, 76, 76, 255]));
        assert_eq!(result.get_pixel(1, 0), &Rgba([150, 150, 150, 255]));
        assert_eq!(result.get_pixel(2, 0), &Rgba([29, 29, 29, 255]));
    }

    #[test]
    fn test_grayscale_preserves_alpha_and_dimensions() {
        let img = RgbaImage::from_pixel(10, 5, Rgba([120, 80, 40, 77]));
        let result = apply(img).unwrap();

        assert_eq!(result.dimensions(), (10, 5));
        assert_eq!(result.get_pixel(4, 2).0[3], 77);
    }

    #[test]
    fn test_grayscale_is_identity_on_gray_pixels() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([128, 128, 128, 255]));
        let result = apply(img).unwrap();
        assert_eq!(result.get_pixel(0, 0), &Rgba([128, 128, 128, 255]));
    }
}
