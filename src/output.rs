//! Results of a conversion run.
//!
//! Everything here is `Serialize` so the CLI can print a run as JSON
//! (`--json`) and library callers can persist it as a job record.

use crate::config::{Style, Viewport};
use crate::error::PageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a successful [`crate::convert`] call produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The written video.
    pub output_path: PathBuf,
    /// Frames directory, present only when it was kept.
    pub frames_dir: Option<PathBuf>,
    pub source: SourceMetadata,
    pub stats: ConversionStats,
}

/// What was read from the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub path: PathBuf,
    /// `"document"` or `"image_sequence"`.
    pub kind: String,
    /// Pages in the document or image files considered in the directory.
    pub item_count: usize,
    /// First item's native size in pixels at reference density.
    pub first_item_size: Option<(u32, u32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// PDF version reported by pdfium, documents only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_version: Option<String>,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionStats {
    pub style: Style,
    pub viewport: Viewport,
    /// Items that made it into the video.
    pub items_used: usize,
    /// Items dropped along the way, with the reason.
    pub skipped: Vec<PageError>,
    pub frame_count: usize,
    /// Scroll style only: pixels advanced per frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stride: Option<u32>,
    /// Length of the written video in seconds.
    pub duration_secs: f64,
    pub load_duration_ms: u64,
    pub frames_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    /// Video length implied by the frame count and pacing.
    pub fn expected_duration(style: Style, viewport: &Viewport, frame_count: usize) -> f64 {
        match style {
            Style::Sequence => frame_count as f64 * viewport.seconds_per_page,
            Style::Scroll => frame_count as f64 / viewport.fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VideoFormat;

    #[test]
    fn duration_follows_style() {
        let vp = Viewport::new(100, 50, 10.0, 2.0, VideoFormat::Mp4).unwrap();
        assert_eq!(ConversionStats::expected_duration(Style::Sequence, &vp, 5), 10.0);
        assert_eq!(ConversionStats::expected_duration(Style::Scroll, &vp, 50), 5.0);
    }

    #[test]
    fn stats_serialize_without_stride_in_sequence_style() {
        let vp = Viewport::new(100, 50, 1.0, 1.0, VideoFormat::Mp4).unwrap();
        let stats = ConversionStats {
            style: Style::Sequence,
            viewport: vp,
            items_used: 2,
            skipped: vec![PageError::UnparsableOrdering {
                name: "cover.png".into(),
            }],
            frame_count: 2,
            stride: None,
            duration_secs: 2.0,
            load_duration_ms: 1,
            frames_duration_ms: 2,
            encode_duration_ms: 3,
            total_duration_ms: 6,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("stride").is_none());
        assert_eq!(json["frame_count"], 2);
        assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn document_metadata_reports_pdf_version() {
        let mut meta = SourceMetadata {
            path: PathBuf::from("slides.pdf"),
            kind: "document".into(),
            item_count: 3,
            first_item_size: Some((612, 792)),
            title: None,
            author: None,
            pdf_version: Some("Pdf1_7".into()),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["pdf_version"], "Pdf1_7");
        assert!(json.get("title").is_none());

        meta.pdf_version = None;
        let json = serde_json::to_value(&meta).unwrap();
        assert!(json.get("pdf_version").is_none());
        let back: SourceMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }
}
