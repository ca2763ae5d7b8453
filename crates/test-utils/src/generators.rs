//! PNG generators for preview images.
//!
//! Blank previews are a single repeated value; non-blank ones carry a
//! gradient so no channel is uniform.

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Encode an image as PNG bytes.
pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}

/// An RGBA PNG where every pixel is `rgba`.
///
/// # Example
///
/// ```
/// use test_utils::solid_png;
///
/// let white = solid_png(200, 150, [255, 255, 255, 255]);
/// assert_eq!(&white[1..4], b"PNG");
/// ```
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
    encode_png(&DynamicImage::ImageRgba8(image))
}

/// An RGB PNG where every pixel is `rgb`.
pub fn solid_rgb_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(rgb));
    encode_png(&DynamicImage::ImageRgb8(image))
}

/// An opaque RGBA PNG with a diagonal colour gradient.
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x + y) % 256) as u8;
        Rgba([r, g, b, 255])
    });
    encode_png(&DynamicImage::ImageRgba8(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_png_decodes_to_requested_size() {
        let bytes = solid_png(4, 3, [0, 0, 0, 255]);
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!(image.width(), 4);
        assert_eq!(image.height(), 3);
    }

    #[test]
    fn test_gradient_png_is_not_uniform() {
        let bytes = gradient_png(16, 16);
        let image = image::load_from_memory(&bytes).unwrap().to_rgba8();
        let first = image.get_pixel(0, 0);
        assert!(image.pixels().any(|p| p != first));
    }
}
