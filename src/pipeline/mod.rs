//! Pipeline stages for document/image-sequence to video conversion.
//!
//! Each submodule implements exactly one transformation step. Stages take
//! an image and return a new one; nothing is mutated in place, so every
//! stage can be tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//!            ┌─▶ render ─┐                ┌─▶ compose ────────┐
//! input ─────┤ (pdfium)  ├─▶ fit ─▶ parity┤                   ├─▶ frames ─▶ encode
//!            └─▶ load ───┘                └─▶ scroll (stitch, ┘   (%06d)   (ffmpeg)
//!              (images)                        then window)
//! ```
//!
//! 1. [`input`]   — classify the source as a document or an image directory
//!    and pick the output path
//! 2. [`render`]  — rasterise pages at a density chosen by [`fit`]; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`load`]    — order and decode a numbered image directory
//! 4. [`fit`]     — isotropic viewport fit and render-density selection
//! 5. [`parity`]  — pad odd dimensions to even
//! 6. [`compose`] — sequence style: centre one item per frame
//! 7. [`scroll`]  — scroll style: stitch all items and slide a window
//! 8. [`frames`]  — zero-padded frame names and the transient directory
//! 9. [`encode`]  — hand the frames directory to the external encoder

pub mod compose;
pub mod encode;
pub mod fit;
pub mod frames;
pub mod input;
pub mod load;
pub mod parity;
pub mod render;
pub mod scroll;
