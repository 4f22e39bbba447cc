//! Input resolution: classify the user-supplied path and derive the output
//! path.
//!
//! ## Why check magic bytes?
//!
//! pdfium reports a non-PDF file as a generic load failure. Reading the
//! first four bytes (`%PDF`) up front lets callers get a meaningful error
//! rather than a "corrupt document" message for a PNG passed by mistake.
//!
//! ## Why never overwrite?
//!
//! Encoding can take minutes and the previous video may be the only copy.
//! When the chosen output path exists, a `+` is inserted before the
//! extension until the name is free: `talk.mp4` → `talk+.mp4` →
//! `talk++.mp4`.

use crate::config::VideoFormat;
use crate::error::Pdf2VideoError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Characters replaced by `_` in derived output names.
const UNSAFE_NAME_CHARS: &[char] = &[' ', '(', ')', '&', '-', '<', '>'];

/// A validated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// A PDF document rendered page by page.
    Document(PathBuf),
    /// A directory of numbered images.
    ImageDir(PathBuf),
}

impl SourceInput {
    pub fn path(&self) -> &Path {
        match self {
            SourceInput::Document(p) | SourceInput::ImageDir(p) => p,
        }
    }

    /// Short label used in logs and run statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceInput::Document(_) => "document",
            SourceInput::ImageDir(_) => "image_sequence",
        }
    }
}

/// Validate a document path: it must exist, be readable, and start with
/// the PDF magic bytes.
pub fn resolve_document(path: impl Into<PathBuf>) -> Result<SourceInput, Pdf2VideoError> {
    let path = path.into();

    if !path.exists() {
        return Err(Pdf2VideoError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2VideoError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2VideoError::PermissionDenied { path });
        }
        Err(e) => return Err(Pdf2VideoError::filesystem(&path, e)),
    }

    debug!("Resolved document: {}", path.display());
    Ok(SourceInput::Document(path))
}

/// Validate an image-sequence directory.
pub fn resolve_image_dir(path: impl Into<PathBuf>) -> Result<SourceInput, Pdf2VideoError> {
    let path = path.into();

    if !path.exists() {
        return Err(Pdf2VideoError::FileNotFound { path });
    }
    if !path.is_dir() {
        return Err(Pdf2VideoError::NotADirectory { path });
    }
    if let Err(e) = std::fs::read_dir(&path) {
        return Err(match e.kind() {
            std::io::ErrorKind::PermissionDenied => Pdf2VideoError::PermissionDenied { path },
            _ => Pdf2VideoError::filesystem(&path, e),
        });
    }

    debug!("Resolved image directory: {}", path.display());
    Ok(SourceInput::ImageDir(path))
}

/// Pick the source kind from the filesystem: directories are image
/// sequences, everything else must be a document.
pub fn resolve_input(path: impl Into<PathBuf>) -> Result<SourceInput, Pdf2VideoError> {
    let path = path.into();
    if path.is_dir() {
        resolve_image_dir(path)
    } else {
        resolve_document(path)
    }
}

/// Replace characters that trip up shells and encoders.
pub fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if UNSAFE_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Default output path: beside the source, named after its stem (or the
/// directory name), with the container's extension.
pub fn default_output_path(source: &SourceInput, format: VideoFormat) -> PathBuf {
    let path = source.path();
    let stem = match source {
        SourceInput::Document(p) => p.file_stem(),
        SourceInput::ImageDir(p) => p.file_name(),
    }
    .map(|s| s.to_string_lossy().into_owned())
    .filter(|s| !s.is_empty() && s != "." && s != "..")
    .unwrap_or_else(|| "video".to_string());

    // A directory's video lands beside it, not inside it.
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    parent.join(format!("{}.{}", sanitize_file_stem(&stem), format.extension()))
}

/// Insert `+` before the extension until `path` does not exist.
pub fn disambiguate(path: &Path) -> PathBuf {
    let mut candidate = path.to_path_buf();
    while candidate.exists() {
        let stem = candidate
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match candidate.extension() {
            Some(ext) => format!("{}+.{}", stem, ext.to_string_lossy()),
            None => format!("{stem}+"),
        };
        candidate.set_file_name(name);
    }
    if candidate != path {
        debug!(
            "Output {} exists, writing {} instead",
            path.display(),
            candidate.display()
        );
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_unsafe_characters() {
        assert_eq!(sanitize_file_stem("my talk (final)"), "my_talk__final_");
        assert_eq!(sanitize_file_stem("a&b-c<d>"), "a_b_c_d_");
        assert_eq!(sanitize_file_stem("plain_name.v2"), "plain_name.v2");
    }

    #[test]
    fn default_output_sits_beside_document() {
        let src = SourceInput::Document(PathBuf::from("/talks/Q3 review.pdf"));
        assert_eq!(
            default_output_path(&src, VideoFormat::Mkv),
            PathBuf::from("/talks/Q3_review.mkv")
        );
    }

    #[test]
    fn default_output_for_directory_is_a_sibling() {
        let src = SourceInput::ImageDir(PathBuf::from("/shots/frames"));
        assert_eq!(
            default_output_path(&src, VideoFormat::Mp4),
            PathBuf::from("/shots/frames.mp4")
        );
    }

    #[test]
    fn disambiguate_inserts_plus_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("talk.mp4");
        assert_eq!(disambiguate(&out), out);

        std::fs::write(&out, b"old").unwrap();
        let second = disambiguate(&out);
        assert_eq!(second, dir.path().join("talk+.mp4"));

        std::fs::write(&second, b"older").unwrap();
        assert_eq!(disambiguate(&out), dir.path().join("talk++.mp4"));
    }

    #[test]
    fn document_must_exist() {
        assert!(matches!(
            resolve_document("/no/such/file.pdf"),
            Err(Pdf2VideoError::FileNotFound { .. })
        ));
    }

    #[test]
    fn document_must_be_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"\x89PNG rest").unwrap();
        match resolve_document(&path) {
            Err(Pdf2VideoError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"\x89PNG"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert_eq!(
            resolve_document(&path).unwrap(),
            SourceInput::Document(path.clone())
        );
    }

    #[test]
    fn image_dir_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("1.png");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            resolve_image_dir(&file),
            Err(Pdf2VideoError::NotADirectory { .. })
        ));
        assert_eq!(
            resolve_input(dir.path()).unwrap(),
            SourceInput::ImageDir(dir.path().to_path_buf())
        );
    }
}
