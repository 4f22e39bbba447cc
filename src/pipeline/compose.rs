//! Sequence composition: centre one fitted raster on a viewport-sized canvas.
//!
//! The fit table in [`super::fit`] leaves slack on at most one axis, so a
//! frame is either pillarboxed (bars left and right) or letterboxed (bars
//! top and bottom), never both. Nothing is scaled here.

use crate::config::Viewport;
use image::{DynamicImage, GenericImageView, GrayAlphaImage, GrayImage, Pixel, Rgb, RgbImage, Rgba, RgbaImage};
use tracing::debug;

/// Build the frame for one sequence item.
pub fn compose_frame(src: &DynamicImage, vp: &Viewport, background: [u8; 3]) -> DynamicImage {
    let (sw, sh) = src.dimensions();
    let (x, y) = centre_offset(sw, sh, vp.width, vp.height);
    if (x, y) == (0, 0) && (sw, sh) == (vp.width, vp.height) {
        return src.clone();
    }

    let mut canvas = blank_canvas(vp.width, vp.height, src.color(), background);
    paste(&mut canvas, src, x as i64, y as i64);
    canvas
}

/// Offset that centres a `src_w × src_h` raster on the canvas.
///
/// Only one axis moves: horizontal slack of two pixels or more wins,
/// otherwise vertical slack of two pixels or more; the offset is half the
/// slack rounded down. A single pixel of slack is left at the far edge.
pub fn centre_offset(src_w: u32, src_h: u32, canvas_w: u32, canvas_h: u32) -> (u32, u32) {
    let slack_w = canvas_w.saturating_sub(src_w);
    let slack_h = canvas_h.saturating_sub(src_h);
    if slack_w >= 2 {
        (slack_w / 2, 0)
    } else if slack_h >= 2 {
        (0, slack_h / 2)
    } else {
        (0, 0)
    }
}

/// Allocate a canvas in `color`'s pixel layout, filled with `background`.
///
/// Layouts without an 8-bit constructor fall back to RGBA8.
pub(crate) fn blank_canvas(
    width: u32,
    height: u32,
    color: image::ColorType,
    background: [u8; 3],
) -> DynamicImage {
    let rgb = Rgb(background);
    match color {
        image::ColorType::L8 => {
            DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, rgb.to_luma()))
        }
        image::ColorType::La8 => {
            DynamicImage::ImageLumaA8(GrayAlphaImage::from_pixel(width, height, rgb.to_luma_alpha()))
        }
        image::ColorType::Rgb8 => DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, rgb)),
        _ => DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([
            background[0],
            background[1],
            background[2],
            255,
        ]))),
    }
}

/// Copy `src` into `canvas` at `(x, y)`, clipping at the canvas edges.
///
/// Matching 8-bit layouts copy directly; anything else converts per pixel.
pub(crate) fn paste(canvas: &mut DynamicImage, src: &DynamicImage, x: i64, y: i64) {
    use image::imageops::replace;

    match (canvas, src) {
        (DynamicImage::ImageRgba8(c), DynamicImage::ImageRgba8(s)) => replace(c, s, x, y),
        (DynamicImage::ImageRgb8(c), DynamicImage::ImageRgb8(s)) => replace(c, s, x, y),
        (DynamicImage::ImageLuma8(c), DynamicImage::ImageLuma8(s)) => replace(c, s, x, y),
        (DynamicImage::ImageLumaA8(c), DynamicImage::ImageLumaA8(s)) => replace(c, s, x, y),
        (c, s) => {
            debug!("converting {:?} → {:?} while pasting", s.color(), c.color());
            replace(c, s, x, y)
        }
    }
}
