//! Viewport fitting: one isotropic scale decision shared by post-hoc image
//! resizing and render-time density selection.
//!
//! ## The decision table
//!
//! Each axis of the source is compared against the viewport on its own:
//!
//! | width vs vp | height vs vp | case          | factor                     |
//! |-------------|--------------|---------------|----------------------------|
//! | `>`         | `>`          | `Shrink`      | `min(vpW/srcW, vpH/srcH)`  |
//! | `<`         | `<`          | `Grow`        | `min(vpW/srcW, vpH/srcH)`  |
//! | `>`         | `<=`         | `WidthBound`  | `vpW/srcW`                 |
//! | `<=`        | `>`          | `HeightBound` | `vpH/srcH`                 |
//! | otherwise   |              | `Unchanged`   | `1.0`                      |
//!
//! "Otherwise" covers exact equality on both axes and the two mixed cases
//! where one axis matches exactly and the other is smaller. Every outcome
//! leaves the scaled source inside the viewport on both axes, and `Grow`
//! deliberately upsamples small sources until one axis touches the edge.
//!
//! Rendering a PDF page applies the same table to the page's point size to
//! pick a rasterisation density, so pages come out of pdfium already at
//! final size instead of being resampled twice.

use crate::config::{Style, Viewport};
use crate::error::Pdf2VideoError;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::cmp::Ordering;
use tracing::debug;

/// Density at which one page-space unit (1/72 in) maps to one pixel.
pub const REFERENCE_DENSITY: f64 = 72.0;

/// Filter used for every resize; bilinear keeps rendered text legible
/// without the ringing of sharper kernels.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Which row of the fit table a source falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitCase {
    /// Both axes larger than the viewport.
    Shrink,
    /// Both axes smaller than the viewport.
    Grow,
    /// Only the width overflows.
    WidthBound,
    /// Only the height overflows.
    HeightBound,
    /// Nothing overflows and the source cannot grow on both axes.
    Unchanged,
}

impl FitCase {
    /// Classify a source size against a viewport size.
    ///
    /// Callers must reject non-finite sizes first; `partial_cmp` treats them
    /// as equal here.
    pub fn classify(src_w: f64, src_h: f64, vp_w: f64, vp_h: f64) -> Self {
        use Ordering::{Equal, Greater, Less};

        let w = src_w.partial_cmp(&vp_w).unwrap_or(Equal);
        let h = src_h.partial_cmp(&vp_h).unwrap_or(Equal);

        match (w, h) {
            (Greater, Greater) => FitCase::Shrink,
            (Less, Less) => FitCase::Grow,
            (Greater, Less | Equal) => FitCase::WidthBound,
            (Less | Equal, Greater) => FitCase::HeightBound,
            (Equal, Equal) | (Less, Equal) | (Equal, Less) => FitCase::Unchanged,
        }
    }

    /// The multiplier this case applies, given the per-axis ratios
    /// `vp_w / src_w` and `vp_h / src_h`.
    pub fn factor(self, ratio_w: f64, ratio_h: f64) -> f64 {
        match self {
            FitCase::Shrink | FitCase::Grow => ratio_w.min(ratio_h),
            FitCase::WidthBound => ratio_w,
            FitCase::HeightBound => ratio_h,
            FitCase::Unchanged => 1.0,
        }
    }
}

fn check_size(what: &str, w: f64, h: f64) -> Result<(), Pdf2VideoError> {
    if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
        return Err(Pdf2VideoError::MalformedInput {
            detail: format!("{what} has unusable size {w}x{h}"),
        });
    }
    Ok(())
}

/// Isotropic scale factor that fits a `src_w × src_h` raster to the viewport.
pub fn scale_factor(src_w: u32, src_h: u32, vp_w: u32, vp_h: u32) -> Result<f64, Pdf2VideoError> {
    let (sw, sh, vw, vh) = (src_w as f64, src_h as f64, vp_w as f64, vp_h as f64);
    check_size("source raster", sw, sh)?;
    check_size("viewport", vw, vh)?;

    let case = FitCase::classify(sw, sh, vw, vh);
    let factor = case.factor(vw / sw, vh / sh);
    debug!("fit {src_w}x{src_h} into {vp_w}x{vp_h}: {case:?} ×{factor:.4}");
    Ok(factor)
}

/// Rasterisation density for a page of `page_w × page_h` points.
///
/// * **Scroll**: the page width maps exactly onto the viewport width; the
///   height follows from the aspect ratio so pages can be stitched.
/// * **Sequence**: the fit table above, expressed as a density.
pub fn select_density(
    page_w: f64,
    page_h: f64,
    vp: &Viewport,
    style: Style,
) -> Result<f64, Pdf2VideoError> {
    check_size("page", page_w, page_h)?;
    let (vw, vh) = (vp.width as f64, vp.height as f64);

    let density = match style {
        Style::Scroll => {
            if page_w == vw {
                REFERENCE_DENSITY
            } else {
                vw * REFERENCE_DENSITY / page_w
            }
        }
        Style::Sequence => {
            let case = FitCase::classify(page_w, page_h, vw, vh);
            case.factor(vw / page_w, vh / page_h) * REFERENCE_DENSITY
        }
    };
    Ok(density)
}

/// Resize `img` by the fit factor. Returns a new image; the input is untouched.
pub fn fit_to_viewport(img: &DynamicImage, vp: &Viewport) -> Result<DynamicImage, Pdf2VideoError> {
    let (w, h) = img.dimensions();
    let factor = scale_factor(w, h, vp.width, vp.height)?;
    Ok(resize_by(img, factor))
}

/// Resize `img` so its width is exactly `width`, preserving aspect ratio.
pub fn fit_to_width(img: &DynamicImage, width: u32) -> Result<DynamicImage, Pdf2VideoError> {
    let (w, h) = img.dimensions();
    check_size("source raster", w as f64, h as f64)?;
    if w == width {
        return Ok(img.clone());
    }
    let factor = width as f64 / w as f64;
    let new_h = scaled(h, factor);
    debug!("fit {w}x{h} to width {width}: {width}x{new_h}");
    Ok(img.resize_exact(width, new_h, RESIZE_FILTER))
}

/// Shrink a freshly rendered page that overshot the viewport by rounding.
///
/// Pages that already fit are returned as-is: growing them again would be
/// the second resample that render-time density selection avoids.
pub fn clamp_to_viewport(img: &DynamicImage, vp: &Viewport) -> Result<DynamicImage, Pdf2VideoError> {
    let (w, h) = img.dimensions();
    if w <= vp.width && h <= vp.height {
        return Ok(img.clone());
    }
    fit_to_viewport(img, vp)
}

fn resize_by(img: &DynamicImage, factor: f64) -> DynamicImage {
    if factor == 1.0 {
        return img.clone();
    }
    let (w, h) = img.dimensions();
    img.resize_exact(scaled(w, factor), scaled(h, factor), RESIZE_FILTER)
}

fn scaled(len: u32, factor: f64) -> u32 {
    ((len as f64 * factor).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoFormat;
    use image::{Rgb, RgbImage};

    fn vp(w: u32, h: u32) -> Viewport {
        Viewport::new(w, h, 1.0, 1.0, VideoFormat::Mp4).unwrap()
    }

    #[test]
    fn classify_covers_every_row() {
        assert_eq!(FitCase::classify(300.0, 300.0, 100.0, 50.0), FitCase::Shrink);
        assert_eq!(FitCase::classify(10.0, 10.0, 100.0, 50.0), FitCase::Grow);
        assert_eq!(FitCase::classify(200.0, 50.0, 100.0, 50.0), FitCase::WidthBound);
        assert_eq!(FitCase::classify(200.0, 10.0, 100.0, 50.0), FitCase::WidthBound);
        assert_eq!(FitCase::classify(100.0, 80.0, 100.0, 50.0), FitCase::HeightBound);
        assert_eq!(FitCase::classify(20.0, 80.0, 100.0, 50.0), FitCase::HeightBound);
        assert_eq!(FitCase::classify(100.0, 50.0, 100.0, 50.0), FitCase::Unchanged);
        assert_eq!(FitCase::classify(40.0, 50.0, 100.0, 50.0), FitCase::Unchanged);
        assert_eq!(FitCase::classify(100.0, 20.0, 100.0, 50.0), FitCase::Unchanged);
    }

    #[test]
    fn width_bound_scenario() {
        // 200×50 into 100×50 → width-bound, ×0.5
        let f = scale_factor(200, 50, 100, 50).unwrap();
        assert_eq!(f, 0.5);
    }

    #[test]
    fn shrink_uses_tighter_axis() {
        let f = scale_factor(400, 400, 100, 50).unwrap();
        assert_eq!(f, 0.125);
    }

    #[test]
    fn grow_upsamples_until_an_axis_fills() {
        let f = scale_factor(20, 20, 100, 50).unwrap();
        assert_eq!(f, 2.5);
    }

    #[test]
    fn height_bound() {
        let f = scale_factor(50, 100, 100, 50).unwrap();
        assert_eq!(f, 0.5);
    }

    #[test]
    fn exact_match_is_identity() {
        assert_eq!(scale_factor(100, 50, 100, 50).unwrap(), 1.0);
    }

    #[test]
    fn zero_size_is_malformed() {
        assert!(matches!(
            scale_factor(0, 50, 100, 50),
            Err(Pdf2VideoError::MalformedInput { .. })
        ));
        assert!(scale_factor(10, 0, 100, 50).is_err());
    }

    #[test]
    fn scaled_source_never_overflows_viewport() {
        let sizes = [1u32, 7, 49, 50, 51, 99, 100, 101, 200, 1999];
        let (vw, vh) = (100.0, 50.0);
        for &sw in &sizes {
            for &sh in &sizes {
                let f = scale_factor(sw, sh, 100, 50).unwrap();
                let (w, h) = (sw as f64 * f, sh as f64 * f);
                assert!(w <= vw + 1e-9 && h <= vh + 1e-9, "{sw}x{sh} → {w}x{h}");
                if sw < 100 && sh < 50 {
                    // grows until one axis fills exactly
                    assert!(
                        (w - vw).abs() < 1e-9 || (h - vh).abs() < 1e-9,
                        "{sw}x{sh} → {w}x{h} under-fills"
                    );
                }
            }
        }
    }

    #[test]
    fn scroll_density_matches_width() {
        let v = vp(1280, 720);
        let d = select_density(612.0, 792.0, &v, Style::Scroll).unwrap();
        assert!((612.0 * d / REFERENCE_DENSITY - 1280.0).abs() < 1e-9);
    }

    #[test]
    fn scroll_density_unchanged_when_width_matches() {
        let v = vp(612, 400);
        let d = select_density(612.0, 792.0, &v, Style::Scroll).unwrap();
        assert_eq!(d, REFERENCE_DENSITY);
    }

    #[test]
    fn sequence_density_follows_fit_table() {
        // Letter portrait into 1280×720: only the height overflows.
        let v = vp(1280, 720);
        let d = select_density(612.0, 792.0, &v, Style::Sequence).unwrap();
        assert!((d - 720.0 * REFERENCE_DENSITY / 792.0).abs() < 1e-9);

        // Exact size → reference density.
        let v = vp(612, 792);
        let d = select_density(612.0, 792.0, &v, Style::Sequence).unwrap();
        assert_eq!(d, REFERENCE_DENSITY);
    }

    #[test]
    fn density_rejects_degenerate_pages() {
        let v = vp(1280, 720);
        assert!(select_density(0.0, 792.0, &v, Style::Sequence).is_err());
        assert!(select_density(612.0, -1.0, &v, Style::Scroll).is_err());
        assert!(select_density(f64::NAN, 792.0, &v, Style::Scroll).is_err());
    }

    #[test]
    fn fit_to_viewport_returns_new_image() {
        let src = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 50, Rgb([9, 9, 9])));
        let out = fit_to_viewport(&src, &vp(100, 50)).unwrap();
        assert_eq!(out.dimensions(), (100, 25));
        assert_eq!(src.dimensions(), (200, 50));
    }

    #[test]
    fn fit_to_width_is_exact() {
        let src = DynamicImage::ImageRgb8(RgbImage::new(333, 101));
        let out = fit_to_width(&src, 100).unwrap();
        assert_eq!(out.width(), 100);
        assert_eq!(out.height(), 30);
    }

    #[test]
    fn clamp_leaves_fitting_pages_alone() {
        let v = vp(100, 50);
        let fits = DynamicImage::ImageRgb8(RgbImage::new(98, 50));
        assert_eq!(clamp_to_viewport(&fits, &v).unwrap().dimensions(), (98, 50));

        let overshoots = DynamicImage::ImageRgb8(RgbImage::new(101, 50));
        let out = clamp_to_viewport(&overshoots, &v).unwrap();
        assert!(out.width() <= 100 && out.height() <= 50);
    }
}
