//! Scroll style: stitch every item into one tall strip, then pan a
//! viewport-sized window down it.
//!
//! ```text
//!  ┌──────────┐  ─┐
//!  │  blank   │   │ vp.height
//!  ├──────────┤  ─┘
//!  │  item 0  │
//!  ├──────────┤
//!  │  item 1  │        window slides by `stride` px per frame,
//!  │    …     │        from offset 0 to composite − vp.height
//!  ├──────────┤  ─┐
//!  │  blank   │   │ vp.height
//!  └──────────┘  ─┘
//! ```
//!
//! The leading margin makes the first page scroll in from below and the
//! trailing one lets the last page scroll fully out.

use super::compose::{blank_canvas, paste};
use crate::config::Viewport;
use crate::error::Pdf2VideoError;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Concatenate width-fitted items top to bottom between two blank margins.
///
/// Every item must already be exactly `vp.width` wide. The composite takes
/// the pixel layout of the first item.
pub fn stitch(
    items: &[DynamicImage],
    vp: &Viewport,
    background: [u8; 3],
) -> Result<DynamicImage, Pdf2VideoError> {
    let first = items.first().ok_or_else(|| Pdf2VideoError::MalformedInput {
        detail: "cannot stitch an empty page set".into(),
    })?;

    let mut content: u64 = 0;
    for (i, item) in items.iter().enumerate() {
        if item.width() != vp.width {
            return Err(Pdf2VideoError::MalformedInput {
                detail: format!(
                    "item {} is {} px wide, expected viewport width {}",
                    i,
                    item.width(),
                    vp.width
                ),
            });
        }
        content += item.height() as u64;
    }

    let total = content + 2 * vp.height as u64;
    let height = u32::try_from(total).map_err(|_| Pdf2VideoError::MalformedInput {
        detail: format!("composite height {total} px is too large"),
    })?;
    info!(
        "Stitching {} items into {}x{} composite",
        items.len(),
        vp.width,
        height
    );

    let mut composite = blank_canvas(vp.width, height, first.color(), background);
    let mut y = vp.height as i64;
    for item in items {
        paste(&mut composite, item, 0, y);
        y += item.height() as i64;
    }

    Ok(composite)
}

/// How the window walks the composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollPlan {
    /// Highest valid window top: `composite_height − vp.height`.
    pub usable_height: u32,
    /// Pixels advanced per frame, at least 1.
    pub stride: u32,
    /// `usable_height / stride + 1` windows, starting at offset 0.
    pub frame_count: usize,
}

impl ScrollPlan {
    /// Work out stride and frame count for a composite.
    ///
    /// `stride = floor(usable / (fps × seconds_per_page × item_count))`,
    /// clamped to 1. The last window sits at or above `usable_height`; a
    /// step that would pass it is dropped rather than clamped.
    pub fn new(composite_height: u32, item_count: usize, vp: &Viewport) -> Result<Self, Pdf2VideoError> {
        if item_count == 0 {
            return Err(Pdf2VideoError::MalformedInput {
                detail: "scroll plan needs at least one item".into(),
            });
        }
        let usable_height = composite_height.checked_sub(vp.height).ok_or_else(|| {
            Pdf2VideoError::MalformedInput {
                detail: format!(
                    "composite height {composite_height} is shorter than the viewport ({})",
                    vp.height
                ),
            }
        })?;

        let frames_wanted = vp.frames_per_item() * item_count as f64;
        let stride = (usable_height as f64 / frames_wanted).floor();
        let stride = if stride >= 1.0 { stride as u32 } else { 1 };
        let frame_count = (usable_height / stride) as usize + 1;

        debug!("scroll plan: usable={usable_height} stride={stride} frames={frame_count}");
        Ok(Self {
            usable_height,
            stride,
            frame_count,
        })
    }

    /// Window top for frame `index`.
    pub fn offset(&self, index: usize) -> u32 {
        index as u32 * self.stride
    }
}

/// Cut the viewport-sized window whose top edge is at `offset`.
pub fn window(composite: &DynamicImage, offset: u32, vp: &Viewport) -> DynamicImage {
    composite.crop_imm(0, offset, vp.width, vp.height)
}
