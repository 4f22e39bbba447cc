//! # edgequake-pdf2video
//!
//! Turn PDF documents and numbered image sequences into videos.
//!
//! ## Two playback styles
//!
//! * **Sequence** — one centred, letterboxed frame per page, each shown for
//!   `seconds_per_page` seconds. Slides, comics, photo sets.
//! * **Scroll** — every page stitched into one tall strip and panned from
//!   top to bottom at a constant speed. Papers, long-form documents.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / image dir
//!  │
//!  ├─ 1. Input    validate the source, pick a free output name
//!  ├─ 2. Load     pdfium render at a fit density, or decode numbered images
//!  ├─ 3. Fit      isotropic viewport fit, pad to even dimensions
//!  ├─ 4. Frames   compose (sequence) or stitch + window (scroll) → %06d files
//!  └─ 5. Encode   external ffmpeg → mp4 / avi / mkv / mov
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2video::{convert, Style, VideoConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = VideoConfig::builder()
//!         .style(Style::Scroll)
//!         .fps(30.0)
//!         .seconds_per_page(6.0)
//!         .build()?;
//!     let output = convert("paper.pdf", &config).await?;
//!     println!("{} ({} frames)", output.output_path.display(), output.stats.frame_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2video` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-pdf2video = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! * a pdfium shared library for PDF input (`PDFIUM_LIB_PATH`, the working
//!   directory, or the system library path)
//! * `ffmpeg` on `PATH`, or any program set via
//!   [`VideoConfigBuilder::encoder_program`]

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    Dimension, FrameFormat, Style, VideoConfig, VideoConfigBuilder, VideoFormat, Viewport,
};
pub use convert::{convert, convert_source, convert_sync, inspect};
pub use error::{PageError, Pdf2VideoError};
pub use output::{ConversionOutput, ConversionStats, SourceMetadata};
pub use pipeline::input::{resolve_document, resolve_image_dir, resolve_input, SourceInput};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
