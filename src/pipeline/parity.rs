//! Even-dimension padding.
//!
//! yuv420p subsamples chroma 2×2, so the encoder rejects odd widths and
//! heights. Odd axes grow by one row/column of zero-valued pixels along the
//! right and bottom edges; the original pixels keep their coordinates and
//! nothing is ever cropped.

use super::compose::paste;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

/// Return a copy of `img` with even width and height.
pub fn sanitize(img: &DynamicImage) -> DynamicImage {
    let (w, h) = img.dimensions();
    let (even_w, even_h) = (w + w % 2, h + h % 2);
    if (even_w, even_h) == (w, h) {
        return img.clone();
    }

    debug!("pad {w}x{h} → {even_w}x{even_h}");
    // `DynamicImage::new` zero-fills in the source's own pixel layout.
    let mut padded = DynamicImage::new(even_w, even_h, img.color());
    paste(&mut padded, img, 0, 0);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn odd_axes_grow_by_one() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 3, Rgb([200, 10, 10])));
        let out = sanitize(&img);
        assert_eq!(out.dimensions(), (6, 4));
        assert_eq!((out.width() % 2, out.height() % 2), (0, 0));
    }

    #[test]
    fn padding_is_zero_and_origin_preserved() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255])));
        let out = sanitize(&img).to_rgba8();
        assert_eq!(out.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
        assert_eq!(out.get_pixel(2, 2), &Rgba([1, 2, 3, 255]));
        assert_eq!(out.get_pixel(3, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(out.get_pixel(0, 3), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn keeps_pixel_layout() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(7, 2, Luma([90])));
        let out = sanitize(&img);
        assert_eq!(out.color(), img.color());
        assert_eq!(out.dimensions(), (8, 2));
    }

    #[test]
    fn even_input_unchanged() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([5, 5, 5])));
        let out = sanitize(&img);
        assert_eq!(out.as_bytes(), img.as_bytes());
    }

    #[test]
    fn idempotent() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(9, 11, Rgb([7, 8, 9])));
        let once = sanitize(&img);
        let twice = sanitize(&once);
        assert_eq!(once.dimensions(), twice.dimensions());
        assert_eq!(once.as_bytes(), twice.as_bytes());
    }
}
