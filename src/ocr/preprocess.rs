//! Image normalization for recognition
//!
//! Converts color input to grayscale, binarizes it with a global Otsu
//! threshold, and runs a small median filter to knock out single-pixel
//! noise without blurring stroke edges.

use image::{DynamicImage, GenericImageView, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::median_filter;
use tracing::debug;

use super::OcrError;

/// Radius of the denoising median filter (1 = 3x3 neighborhood)
const MEDIAN_RADIUS: u32 = 1;

/// Normalize an image into the two-intensity grayscale form handed to the
/// recognition engine. The input is never mutated; identical input always
/// produces identical output.
pub fn normalize(image: &DynamicImage) -> Result<GrayImage, OcrError> {
    check_layout(image)?;

    let gray = match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        _ => image.to_luma8(),
    };

    let level = otsu_level(&gray);
    let binary = threshold(&gray, level, ThresholdType::Binary);
    let denoised = median_filter(&binary, MEDIAN_RADIUS, MEDIAN_RADIUS);

    debug!(
        "Normalized {}x{} image at Otsu level {}",
        denoised.width(),
        denoised.height(),
        level
    );

    Ok(denoised)
}

/// Reject images the pipeline cannot represent: zero-sized bitmaps and
/// channel layouts other than 8-bit grayscale or RGB.
pub fn check_layout(image: &DynamicImage) -> Result<(), OcrError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(OcrError::InvalidImage(format!(
            "zero-sized image ({width}x{height})"
        )));
    }

    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Ok(()),
        other => Err(OcrError::InvalidImage(format!(
            "unsupported channel layout {:?}, expected 8-bit grayscale or RGB",
            other.color()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use std::collections::HashSet;

    /// Light background with a dark band, enough contrast for Otsu to split
    fn two_tone_rgb() -> DynamicImage {
        let mut img = RgbImage::from_pixel(60, 40, Rgb([230, 230, 230]));
        for y in 10..20 {
            for x in 10..50 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    fn distinct_values(image: &GrayImage) -> HashSet<u8> {
        image.pixels().map(|p| p.0[0]).collect()
    }

    #[test]
    fn test_normalize_color_image_is_binary_with_same_dimensions() {
        let input = two_tone_rgb();
        let output = normalize(&input).unwrap();

        assert_eq!(output.dimensions(), (60, 40));
        let values = distinct_values(&output);
        assert_eq!(values.len(), 2, "expected exactly two intensities: {values:?}");
        assert!(values.contains(&0));
        assert!(values.contains(&255));
    }

    #[test]
    fn test_normalize_grayscale_passthrough_keeps_dimensions() {
        let mut gray = GrayImage::from_pixel(30, 30, Luma([240]));
        for x in 5..25 {
            gray.put_pixel(x, 15, Luma([10]));
        }
        let output = normalize(&DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(output.dimensions(), (30, 30));
        assert!(distinct_values(&output).len() <= 2);
    }

    #[test]
    fn test_rethresholding_binary_image_is_identity() {
        let binary = normalize(&two_tone_rgb()).unwrap();
        let again = threshold(&binary, otsu_level(&binary), ThresholdType::Binary);
        assert_eq!(again, binary);
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let input = two_tone_rgb();
        let before = input.clone();
        let _ = normalize(&input).unwrap();
        assert_eq!(input.to_rgb8(), before.to_rgb8());
    }

    #[test]
    fn test_median_filter_removes_isolated_pixel() {
        // A lone dark pixel on a light background is noise, not text
        let mut img = RgbImage::from_pixel(21, 21, Rgb([255, 255, 255]));
        img.put_pixel(10, 10, Rgb([0, 0, 0]));

        let output = normalize(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(output.get_pixel(10, 10).0[0], 255);
    }

    #[test]
    fn test_zero_sized_image_rejected() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            normalize(&empty),
            Err(OcrError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_rgba_layout_rejected() {
        let rgba = DynamicImage::ImageRgba8(image::RgbaImage::new(10, 10));
        assert!(matches!(
            normalize(&rgba),
            Err(OcrError::InvalidImage(_))
        ));
        assert!(matches!(
            check_layout(&rgba),
            Err(OcrError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_check_layout_accepts_rgb_and_grayscale() {
        assert!(check_layout(&DynamicImage::ImageRgb8(RgbImage::new(4, 4))).is_ok());
        assert!(check_layout(&DynamicImage::ImageLuma8(GrayImage::new(4, 4))).is_ok());
    }
}
