//! Frame files on disk: naming, the transient frames directory, and writing.
//!
//! The encoder reads frames through a `%06d` pattern, so names must be
//! exactly six zero-padded digits, contiguous from `000000`. Indices are
//! assigned before any work starts; parallel writers only ever write the
//! file for the index they were handed.

use crate::config::{FrameFormat, Viewport};
use crate::error::Pdf2VideoError;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Highest index a six-digit name can carry.
pub const MAX_FRAME_INDEX: usize = 999_999;

/// Prefix of the transient frames directory.
const FRAMES_DIR_PREFIX: &str = "pdf2video-frames-";

/// Six-digit, zero-padded frame name without extension.
pub fn frame_name(index: usize) -> Result<String, Pdf2VideoError> {
    if index > MAX_FRAME_INDEX {
        return Err(Pdf2VideoError::FrameIndexOutOfRange {
            index,
            max: MAX_FRAME_INDEX,
        });
    }
    Ok(format!("{index:06}"))
}

/// `{name}.{ext}` for frame `index`.
pub fn frame_file_name(index: usize, format: FrameFormat) -> Result<String, Pdf2VideoError> {
    Ok(format!("{}.{}", frame_name(index)?, format.extension()))
}

/// Fail before any file is written if a run would need too many frames.
pub fn check_frame_count(count: usize) -> Result<(), Pdf2VideoError> {
    if count > MAX_FRAME_INDEX + 1 {
        return Err(Pdf2VideoError::FrameIndexOutOfRange {
            index: count - 1,
            max: MAX_FRAME_INDEX,
        });
    }
    Ok(())
}

/// The per-run frames directory.
///
/// Created with a collision-checked unique name. Dropping it deletes the
/// directory, so a run that fails before encoding leaves nothing behind;
/// [`FramesDir::keep`] and [`FramesDir::remove`] make the outcome explicit
/// once encoding has been attempted.
#[derive(Debug)]
pub struct FramesDir {
    dir: TempDir,
}

impl FramesDir {
    /// Create a fresh frames directory inside `parent`.
    pub fn create(parent: &Path) -> Result<Self, Pdf2VideoError> {
        let dir = tempfile::Builder::new()
            .prefix(FRAMES_DIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| Pdf2VideoError::filesystem(parent, e))?;
        info!("Created frames directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the file for frame `index`.
    pub fn frame_path(&self, index: usize, format: FrameFormat) -> Result<PathBuf, Pdf2VideoError> {
        Ok(self.path().join(frame_file_name(index, format)?))
    }

    /// The `%06d` pattern handed to the encoder.
    pub fn input_pattern(&self, format: FrameFormat) -> PathBuf {
        self.path().join(format!("%06d.{}", format.extension()))
    }

    /// Retain the directory on disk and return its path.
    pub fn keep(self) -> PathBuf {
        let path = self.dir.keep();
        info!("Kept frames directory: {}", path.display());
        path
    }

    /// Delete the directory now, reporting any failure.
    pub fn remove(self) -> Result<(), Pdf2VideoError> {
        let path = self.path().to_path_buf();
        self.dir
            .close()
            .map_err(|e| Pdf2VideoError::filesystem(&path, e))?;
        debug!("Removed frames directory: {}", path.display());
        Ok(())
    }
}

/// Encode `frame` to `path`.
///
/// Frames must match the viewport exactly; a mismatch is an internal bug
/// and is reported rather than handed to the encoder.
pub fn write_frame(
    frame: &DynamicImage,
    path: &Path,
    format: FrameFormat,
    vp: &Viewport,
) -> Result<(), Pdf2VideoError> {
    if frame.dimensions() != (vp.width, vp.height) {
        return Err(Pdf2VideoError::Internal(format!(
            "frame {} is {}x{}, expected {}x{}",
            path.display(),
            frame.width(),
            frame.height(),
            vp.width,
            vp.height
        )));
    }

    let write_err = |source: image::ImageError| Pdf2VideoError::FrameWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    match format {
        FrameFormat::Jpeg { quality } => {
            let file = File::create(path).map_err(|e| Pdf2VideoError::filesystem(path, e))?;
            let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
            // JPEG carries no alpha channel.
            match frame {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
                    frame.write_with_encoder(encoder).map_err(write_err)?
                }
                other => DynamicImage::ImageRgb8(other.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(write_err)?,
            }
        }
        FrameFormat::Png => frame
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(write_err)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoFormat;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn vp(w: u32, h: u32) -> Viewport {
        Viewport::new(w, h, 1.0, 1.0, VideoFormat::Mp4).unwrap()
    }

    #[test]
    fn names_are_six_digits() {
        assert_eq!(frame_name(0).unwrap(), "000000");
        assert_eq!(frame_name(42).unwrap(), "000042");
        assert_eq!(frame_name(999_999).unwrap(), "999999");
    }

    #[test]
    fn overflow_fails_fast() {
        assert!(matches!(
            frame_name(1_000_000),
            Err(Pdf2VideoError::FrameIndexOutOfRange { index: 1_000_000, .. })
        ));
        assert!(check_frame_count(1_000_000).is_ok());
        assert!(check_frame_count(1_000_001).is_err());
    }

    #[test]
    fn every_index_has_a_unique_sortable_name() {
        let mut previous = frame_name(0).unwrap();
        for index in 1..=MAX_FRAME_INDEX {
            let name = frame_name(index).unwrap();
            assert_eq!(name.len(), 6, "{name}");
            assert!(previous < name, "{previous} !< {name}");
            previous = name;
        }
    }

    #[test]
    fn file_name_carries_extension() {
        assert_eq!(frame_file_name(7, FrameFormat::Png).unwrap(), "000007.png");
        assert_eq!(
            frame_file_name(7, FrameFormat::Jpeg { quality: 90 }).unwrap(),
            "000007.jpg"
        );
    }

    #[test]
    fn frames_dir_is_unique_and_removable() {
        let parent = tempfile::tempdir().unwrap();
        let a = FramesDir::create(parent.path()).unwrap();
        let b = FramesDir::create(parent.path()).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(FRAMES_DIR_PREFIX));

        let a_path = a.path().to_path_buf();
        a.remove().unwrap();
        assert!(!a_path.exists());

        let b_path = b.keep();
        assert!(b_path.exists());
    }

    #[test]
    fn dropping_frames_dir_deletes_it() {
        let parent = tempfile::tempdir().unwrap();
        let path = {
            let dir = FramesDir::create(parent.path()).unwrap();
            dir.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn input_pattern_uses_six_digit_placeholder() {
        let parent = tempfile::tempdir().unwrap();
        let dir = FramesDir::create(parent.path()).unwrap();
        let pattern = dir.input_pattern(FrameFormat::Png);
        assert!(pattern.to_string_lossy().ends_with("%06d.png"));
    }

    #[test]
    fn writes_jpeg_from_rgba() {
        let parent = tempfile::tempdir().unwrap();
        let path = parent.path().join("000000.jpg");
        let frame = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255])));
        write_frame(&frame, &path, FrameFormat::Jpeg { quality: 90 }, &vp(8, 4)).unwrap();
        let back = image::open(&path).unwrap();
        assert_eq!(back.dimensions(), (8, 4));
    }

    #[test]
    fn writes_png_losslessly() {
        let parent = tempfile::tempdir().unwrap();
        let path = parent.path().join("000000.png");
        let frame = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([1, 2, 3])));
        write_frame(&frame, &path, FrameFormat::Png, &vp(4, 2)).unwrap();
        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.get_pixel(3, 1), &Rgb([1, 2, 3]));
    }

    #[test]
    fn rejects_wrong_sized_frame() {
        let parent = tempfile::tempdir().unwrap();
        let path = parent.path().join("000000.png");
        let frame = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        assert!(write_frame(&frame, &path, FrameFormat::Png, &vp(4, 2)).is_err());
        assert!(!path.exists());
    }
}
