//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::VideoConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline loads sources, writes frames and runs
//! the encoder.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a terminal progress bar or a job record
//! without the library knowing how the host application communicates. The
//! trait is `Send + Sync` because frames are written by concurrent blocking
//! tasks.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2video::{ConversionProgressCallback, VideoConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_frame_written(&self, frame_index: usize, total_frames: usize) {
//!         let done = self.written.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("frame {frame_index} written ({done}/{total_frames})");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = VideoConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the conversion pipeline as a run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// `on_frame_written` is called from the worker that wrote the frame, so
/// calls arrive concurrently and out of index order. Implementations must
/// protect shared mutable state with appropriate synchronisation primitives
/// (e.g. `Mutex`, `AtomicUsize`).
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the source has been opened.
    ///
    /// # Arguments
    /// * `total_items` — pages in the document or images in the directory
    fn on_conversion_start(&self, total_items: usize) {
        let _ = total_items;
    }

    /// Called after each page is rendered or each image decoded.
    ///
    /// # Arguments
    /// * `item_num`    — 1-indexed position in the source
    /// * `total_items` — total items in the source
    fn on_item_loaded(&self, item_num: usize, total_items: usize) {
        let _ = (item_num, total_items);
    }

    /// Called for every item that is skipped.
    fn on_item_skipped(&self, error: &str) {
        let _ = error;
    }

    /// Called once the frame count is known, before any frame is written.
    fn on_frames_start(&self, total_frames: usize) {
        let _ = total_frames;
    }

    /// Called after each frame file is written.
    ///
    /// # Arguments
    /// * `frame_index`  — 0-indexed frame number
    /// * `total_frames` — frames in the run
    fn on_frame_written(&self, frame_index: usize, total_frames: usize) {
        let _ = (frame_index, total_frames);
    }

    /// Called just before the encoder is started.
    fn on_encode_start(&self, output: &Path) {
        let _ = output;
    }

    /// Called once the video has been written.
    fn on_conversion_complete(&self, total_frames: usize, output: &Path) {
        let _ = (total_frames, output);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::VideoConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_item_loaded(1, 5);
        cb.on_item_skipped("page 2: bad");
        cb.on_frames_start(10);
        cb.on_frame_written(0, 10);
        cb.on_encode_start(Path::new("out.mp4"));
        cb.on_conversion_complete(10, Path::new("out.mp4"));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_conversion_start(10);
        cb.on_frame_written(0, 10);
    }
}
