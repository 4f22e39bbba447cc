//! Image-sequence loading: order a directory of images by the frame number
//! at the start of each filename.
//!
//! `1.png`, `02_title.jpg` and `10.png` sort as 1, 2, 10 regardless of how
//! the filesystem lists them. Files without a leading number are skipped
//! with a warning. Two files claiming the same number are resolved by name:
//! the one sorting last wins and the other is reported. Gaps in the
//! numbering are reported once and otherwise ignored; they never produce
//! blank frames.

use crate::error::{PageError, Pdf2VideoError};
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

static RE_FRAME_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)").unwrap());

/// How many missing indices to list before summarising.
const GAP_REPORT_LIMIT: usize = 10;

/// One image file with its parsed display position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceEntry {
    pub index: u64,
    pub path: PathBuf,
}

/// Leading decimal number of a filename, if any.
pub fn parse_frame_number(file_name: &str) -> Option<u64> {
    RE_FRAME_NUMBER
        .captures(file_name)
        .and_then(|caps| caps[1].parse().ok())
}

/// List and order the images in `dir`.
///
/// Returns the ordered entries plus the per-file problems that caused
/// files to be skipped.
pub fn scan_directory(dir: &Path) -> Result<(Vec<SequenceEntry>, Vec<PageError>), Pdf2VideoError> {
    let read = std::fs::read_dir(dir).map_err(|e| Pdf2VideoError::filesystem(dir, e))?;

    let mut files = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| Pdf2VideoError::filesystem(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            debug!("Skipping hidden file {}", name);
            continue;
        }
        files.push((name, path));
    }

    let (entries, skipped) = order_entries(files);
    info!(
        "Found {} ordered images in {} ({} skipped)",
        entries.len(),
        dir.display(),
        skipped.len()
    );
    Ok((entries, skipped))
}

/// Turn `(file name, path)` pairs into a gapless display order.
pub fn order_entries(files: Vec<(String, PathBuf)>) -> (Vec<SequenceEntry>, Vec<PageError>) {
    let mut skipped = Vec::new();
    let mut numbered: Vec<(u64, String, PathBuf)> = Vec::with_capacity(files.len());

    for (name, path) in files {
        match parse_frame_number(&name) {
            Some(index) => numbered.push((index, name, path)),
            None => {
                let err = PageError::UnparsableOrdering { name };
                warn!("Skipping {}", err);
                skipped.push(err);
            }
        }
    }

    numbered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut entries: Vec<SequenceEntry> = Vec::with_capacity(numbered.len());
    for (index, name, path) in numbered {
        match entries.last_mut() {
            Some(last) if last.index == index => {
                warn!(
                    "Frame number {} is used twice; '{}' replaces '{}'",
                    index,
                    name,
                    last.path.display()
                );
                last.path = path;
            }
            _ => entries.push(SequenceEntry { index, path }),
        }
    }

    report_gaps(&entries);
    (entries, skipped)
}

fn report_gaps(entries: &[SequenceEntry]) {
    let mut missing = Vec::new();
    let mut total = 0u64;
    for pair in entries.windows(2) {
        let (lo, hi) = (pair[0].index, pair[1].index);
        total += hi - lo - 1;
        for i in (lo + 1..hi).take(GAP_REPORT_LIMIT.saturating_sub(missing.len())) {
            missing.push(i.to_string());
        }
    }
    if total == 0 {
        return;
    }
    let more = if total > missing.len() as u64 {
        format!(" (+{} more)", total - missing.len() as u64)
    } else {
        String::new()
    };
    warn!(
        "Image sequence has gaps; missing frame numbers: {}{}",
        missing.join(", "),
        more
    );
}

/// Decode one entry.
pub fn load_image(entry: &SequenceEntry) -> Result<DynamicImage, PageError> {
    let img = image::open(&entry.path).map_err(|e| classify_decode_error(&entry.path, e))?;
    debug!(
        "Loaded {} → {}x{} {:?}",
        entry.path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

fn classify_decode_error(path: &Path, e: image::ImageError) -> PageError {
    match e {
        image::ImageError::Unsupported(detail) => PageError::UnsupportedFormat {
            item: path.display().to_string(),
            detail: detail.to_string(),
        },
        other => PageError::DecodeFailed {
            path: path.to_path_buf(),
            detail: other.to_string(),
        },
    }
}

/// Native size of the first decodable entry, read from the header only.
pub fn first_native_size(entries: &[SequenceEntry]) -> Option<(u32, u32)> {
    entries
        .iter()
        .find_map(|e| image::image_dimensions(&e.path).ok())
}
