//! Token box rendering
//!
//! Draws rectangles around recognized tokens on a copy of the processed
//! image. Grayscale input is promoted to RGB so the boxes can be colored.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::{BoundingBox, TokenRecord};

/// Tokens at or below this confidence are left unboxed
pub const DEFAULT_CONFIDENCE_THRESHOLD: i32 = 30;

/// Box stroke color
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Box stroke width in pixels
const STROKE_WIDTH: u32 = 2;

/// Draw an unfilled rectangle around every token whose confidence is
/// strictly above the threshold. A negative threshold disables filtering
/// entirely, so structural entries with the -1 sentinel are drawn too.
/// The input image is never mutated.
pub fn draw_token_boxes(
    image: &DynamicImage,
    tokens: &[TokenRecord],
    confidence_threshold: i32,
) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for token in tokens {
        if confidence_threshold >= 0 && token.confidence <= confidence_threshold {
            continue;
        }
        draw_box(&mut canvas, &token.bounds);
    }

    canvas
}

fn draw_box(canvas: &mut RgbImage, bounds: &BoundingBox) {
    if bounds.width == 0 || bounds.height == 0 {
        return;
    }

    // Stroke inward so the outer edge stays on the reported geometry
    for inset in 0..STROKE_WIDTH {
        if bounds.width <= 2 * inset || bounds.height <= 2 * inset {
            break;
        }
        let rect = Rect::at(bounds.left as i32 + inset as i32, bounds.top as i32 + inset as i32)
            .of_size(bounds.width - 2 * inset, bounds.height - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
    }
}
