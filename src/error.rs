//! Error types for the edgequake-pdf2video library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2VideoError`] — **Fatal**: the run cannot proceed at all (bad
//!   input path, no usable source items, a frame could not be written, the
//!   encoder exited non-zero). Returned as `Err(Pdf2VideoError)` from the
//!   top-level `convert*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page or image could not be
//!   used (undecodable page, filename without a frame number). The item is
//!   skipped, a warning is logged, and the error is recorded in
//!   [`crate::output::ConversionStats::skipped`] so callers can report it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2video library.
#[derive(Debug, Error)]
pub enum Pdf2VideoError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input path does not exist.
    #[error("Input not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the input.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// An image-sequence input was given that is not a directory.
    #[error("Image sequence path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Geometry errors ───────────────────────────────────────────────────
    /// A raster or page reported a zero, negative or non-finite size.
    #[error("Malformed input: {detail}")]
    MalformedInput { detail: String },

    /// Every item was skipped (or there were none to begin with).
    #[error("No usable pages or images in '{path}' ({skipped} skipped)")]
    EmptySource { path: PathBuf, skipped: usize },

    /// Builder or viewport validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run would need more frames than six-digit names can express.
    #[error("Frame index {index} exceeds the supported maximum of {max}")]
    FrameIndexOutOfRange { index: usize, max: usize },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Creating, reading or deleting a directory failed.
    #[error("Filesystem error on '{path}': {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A frame image could not be encoded or written.
    #[error("Failed to write frame '{path}': {source}")]
    FrameWriteFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Encoder errors ────────────────────────────────────────────────────
    /// The encoder program could not be started.
    #[error("Encoder '{program}' could not be started: {detail}\nIs ffmpeg installed and on PATH?")]
    EncoderNotFound { program: String, detail: String },

    /// The encoder ran but exited with a failure status.
    ///
    /// Frames are always retained in this case so encoding can be retried
    /// by hand.
    #[error("Encoder exited with {status}: {stderr}\nFrames kept in '{frames_dir}'")]
    EncoderFailed {
        status: String,
        stderr: String,
        frames_dir: PathBuf,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2VideoError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// A non-fatal error for a single page or image.
///
/// Page numbers are 1-indexed, matching what users see in a PDF viewer.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The filename carries no leading frame number.
    #[error("'{name}': no frame number at the start of the filename")]
    UnparsableOrdering { name: String },

    /// The page reported a zero, negative or non-finite size.
    #[error("Page {page}: malformed size {width}x{height}")]
    MalformedPage { page: usize, width: f64, height: f64 },

    /// The pixel format or image encoding is not supported.
    #[error("'{item}': unsupported format: {detail}")]
    UnsupportedFormat { item: String, detail: String },

    /// pdfium failed to rasterise the page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The image file could not be read or decoded.
    #[error("'{path}': decode failed: {detail}")]
    DecodeFailed { path: PathBuf, detail: String },
}
