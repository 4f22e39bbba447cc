//! Configuration types for PDF/image-sequence to video conversion.
//!
//! All run behaviour is controlled through [`VideoConfig`], built via its
//! [`VideoConfigBuilder`]. The config describes what the user *asked* for;
//! the [`Viewport`] is what a run actually uses once `auto` dimensions have
//! been resolved against the first source item.
//!
//! # Design choice: builder over constructor
//! Most callers only touch two or three knobs (resolution, style, fps).
//! The builder lets them set exactly those and rely on documented defaults
//! for the rest, while `build()` is the single place validation happens.

use crate::error::Pdf2VideoError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for a conversion run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2video::{Dimension, Style, VideoConfig};
///
/// let config = VideoConfig::builder()
///     .resolution(Dimension::Pixels(1920), Dimension::Pixels(1080))
///     .fps(30.0)
///     .seconds_per_page(4.0)
///     .style(Style::Scroll)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct VideoConfig {
    /// Output width. `Auto` takes the first item's native width. Default: 1280.
    pub width: Dimension,

    /// Output height. `Auto` takes the first item's native height. Default: 720.
    pub height: Dimension,

    /// Output frame rate. Default: 1.0.
    pub fps: f64,

    /// Seconds each page (or image) stays on screen. Default: 1.0.
    ///
    /// In scroll style this sets the pan speed: the whole composite takes
    /// `items × seconds_per_page` seconds to pass through the viewport.
    pub seconds_per_page: f64,

    /// Container written by the encoder. Default: MP4.
    pub format: VideoFormat,

    /// Sequence (one centred frame per page) or scroll (vertical pan). Default: Sequence.
    pub style: Style,

    /// Codec used for the intermediate frame files. Default: JPEG quality 90.
    pub frame_format: FrameFormat,

    /// Canvas fill for letterbox/pillarbox bars and scroll margins. Default: black.
    pub background: [u8; 3],

    /// Keep the frames directory after a successful encode. Default: false.
    ///
    /// Frames are always kept when the encoder fails.
    pub keep_frames: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Number of frames composed and written in parallel. Default: available cores.
    pub concurrency: usize,

    /// Encoder executable. Default: `ffmpeg`.
    pub encoder_program: String,

    /// Explicit output path. If None, derived from the input name.
    pub output: Option<PathBuf>,

    /// Where the transient frames directory is created. If None, the system temp dir.
    pub frames_parent: Option<PathBuf>,

    /// Optional per-frame progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: Dimension::Pixels(1280),
            height: Dimension::Pixels(720),
            fps: 1.0,
            seconds_per_page: 1.0,
            format: VideoFormat::default(),
            style: Style::default(),
            frame_format: FrameFormat::default(),
            background: [0, 0, 0],
            keep_frames: false,
            password: None,
            concurrency: default_concurrency(),
            encoder_program: "ffmpeg".to_string(),
            output: None,
            frames_parent: None,
            progress_callback: None,
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl fmt::Debug for VideoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("fps", &self.fps)
            .field("seconds_per_page", &self.seconds_per_page)
            .field("format", &self.format)
            .field("style", &self.style)
            .field("frame_format", &self.frame_format)
            .field("background", &self.background)
            .field("keep_frames", &self.keep_frames)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("concurrency", &self.concurrency)
            .field("encoder_program", &self.encoder_program)
            .field("output", &self.output)
            .field("frames_parent", &self.frames_parent)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl VideoConfig {
    /// Create a new builder for `VideoConfig`.
    pub fn builder() -> VideoConfigBuilder {
        VideoConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolve the run's [`Viewport`].
    ///
    /// `native` is the first source item's size at reference density; it is
    /// only consulted for `Auto` dimensions and is rounded up to even.
    pub fn resolve_viewport(&self, native: (u32, u32)) -> Result<Viewport, Pdf2VideoError> {
        let width = match self.width {
            Dimension::Pixels(px) => px,
            Dimension::Auto => round_up_even(native.0),
        };
        let height = match self.height {
            Dimension::Pixels(px) => px,
            Dimension::Auto => round_up_even(native.1),
        };
        Viewport::new(width, height, self.fps, self.seconds_per_page, self.format)
    }
}

fn round_up_even(n: u32) -> u32 {
    if n % 2 == 0 {
        n
    } else {
        n.saturating_add(1)
    }
}

/// Builder for [`VideoConfig`].
#[derive(Debug)]
pub struct VideoConfigBuilder {
    config: VideoConfig,
}

impl VideoConfigBuilder {
    pub fn resolution(mut self, width: Dimension, height: Dimension) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    pub fn fps(mut self, fps: f64) -> Self {
        self.config.fps = fps;
        self
    }

    pub fn seconds_per_page(mut self, secs: f64) -> Self {
        self.config.seconds_per_page = secs;
        self
    }

    pub fn format(mut self, format: VideoFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.config.style = style;
        self
    }

    pub fn frame_format(mut self, frame_format: FrameFormat) -> Self {
        self.config.frame_format = frame_format;
        self
    }

    pub fn background(mut self, rgb: [u8; 3]) -> Self {
        self.config.background = rgb;
        self
    }

    pub fn keep_frames(mut self, keep: bool) -> Self {
        self.config.keep_frames = keep;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn encoder_program(mut self, program: impl Into<String>) -> Self {
        self.config.encoder_program = program.into();
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = Some(path.into());
        self
    }

    pub fn frames_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.frames_parent = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Explicit dimensions are checked here; `Auto` dimensions are checked
    /// when the viewport is resolved.
    pub fn build(self) -> Result<VideoConfig, Pdf2VideoError> {
        let c = &self.config;
        for (axis, dim) in [("width", c.width), ("height", c.height)] {
            if let Dimension::Pixels(px) = dim {
                check_dimension(axis, px)?;
            }
        }
        check_timing(c.fps, c.seconds_per_page)?;
        if let FrameFormat::Jpeg { quality } = c.frame_format {
            if !(1..=100).contains(&quality) {
                return Err(Pdf2VideoError::InvalidConfig(format!(
                    "JPEG quality must be 1–100, got {quality}"
                )));
            }
        }
        if c.encoder_program.trim().is_empty() {
            return Err(Pdf2VideoError::InvalidConfig(
                "Encoder program must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

fn check_dimension(axis: &str, px: u32) -> Result<(), Pdf2VideoError> {
    if px == 0 {
        return Err(Pdf2VideoError::InvalidConfig(format!(
            "Viewport {axis} must be > 0"
        )));
    }
    if px % 2 != 0 {
        return Err(Pdf2VideoError::InvalidConfig(format!(
            "Viewport {axis} must be even for yuv420p encoding, got {px}"
        )));
    }
    Ok(())
}

fn check_timing(fps: f64, seconds_per_page: f64) -> Result<(), Pdf2VideoError> {
    if !(fps.is_finite() && fps > 0.0) {
        return Err(Pdf2VideoError::InvalidConfig(format!(
            "FPS must be > 0, got {fps}"
        )));
    }
    if !(seconds_per_page.is_finite() && seconds_per_page > 0.0) {
        return Err(Pdf2VideoError::InvalidConfig(format!(
            "Seconds per page must be > 0, got {seconds_per_page}"
        )));
    }
    Ok(())
}

// ── Viewport ─────────────────────────────────────────────────────────────

/// The fixed output canvas and pacing of one run.
///
/// Immutable once resolved; every frame file has exactly
/// `width × height` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub seconds_per_page: f64,
    pub format: VideoFormat,
}

impl Viewport {
    /// Create a validated viewport: positive even dimensions, positive timing.
    pub fn new(
        width: u32,
        height: u32,
        fps: f64,
        seconds_per_page: f64,
        format: VideoFormat,
    ) -> Result<Self, Pdf2VideoError> {
        check_dimension("width", width)?;
        check_dimension("height", height)?;
        check_timing(fps, seconds_per_page)?;
        Ok(Self {
            width,
            height,
            fps,
            seconds_per_page,
            format,
        })
    }

    /// Frames spent on each source item: `fps × seconds_per_page`.
    pub fn frames_per_item(&self) -> f64 {
        self.fps * self.seconds_per_page
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// A requested output dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    /// Take the size from the first source item.
    Auto,
    /// A fixed pixel count.
    Pixels(u32),
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") || s == "-1" {
            return Ok(Dimension::Auto);
        }
        s.parse::<u32>()
            .map(Dimension::Pixels)
            .map_err(|_| format!("expected a pixel count or 'auto', got '{s}'"))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Auto => f.write_str("auto"),
            Dimension::Pixels(px) => write!(f, "{px}"),
        }
    }
}

/// How source items map onto frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Style {
    /// One discrete, centred frame per page or image. (default)
    #[default]
    Sequence,
    /// Continuous vertical pan over all pages stitched end to end.
    Scroll,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Sequence => f.write_str("SEQUENCE"),
            Style::Scroll => f.write_str("SCROLL"),
        }
    }
}

/// Video container written by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoFormat {
    #[default]
    Mp4,
    Avi,
    Mkv,
    Mov,
}

impl VideoFormat {
    /// Lowercase file extension, as ffmpeg expects it.
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Avi => "avi",
            VideoFormat::Mkv => "mkv",
            VideoFormat::Mov => "mov",
        }
    }
}

impl FromStr for VideoFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(VideoFormat::Mp4),
            "avi" => Ok(VideoFormat::Avi),
            "mkv" => Ok(VideoFormat::Mkv),
            "mov" => Ok(VideoFormat::Mov),
            other => Err(format!("video format '{other}' is not supported")),
        }
    }
}

/// Codec for the intermediate frame files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Lossy, small. `quality` is 1–100.
    Jpeg { quality: u8 },
    /// Lossless, larger and slower to write.
    Png,
}

impl Default for FrameFormat {
    fn default() -> Self {
        FrameFormat::Jpeg { quality: 90 }
    }
}

impl FrameFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Jpeg { .. } => "jpg",
            FrameFormat::Png => "png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = VideoConfig::builder().build().unwrap();
        assert_eq!(config.width, Dimension::Pixels(1280));
        assert_eq!(config.height, Dimension::Pixels(720));
        assert_eq!(config.style, Style::Sequence);
        assert_eq!(config.format, VideoFormat::Mp4);
        assert!(!config.keep_frames);
    }

    #[test]
    fn odd_dimension_rejected() {
        let err = VideoConfig::builder()
            .resolution(Dimension::Pixels(1281), Dimension::Pixels(720))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("even"), "got: {err}");
    }

    #[test]
    fn zero_dimension_rejected() {
        assert!(VideoConfig::builder()
            .resolution(Dimension::Pixels(1280), Dimension::Pixels(0))
            .build()
            .is_err());
    }

    #[test]
    fn non_positive_timing_rejected() {
        assert!(VideoConfig::builder().fps(0.0).build().is_err());
        assert!(VideoConfig::builder().seconds_per_page(-1.0).build().is_err());
        assert!(VideoConfig::builder().fps(f64::NAN).build().is_err());
    }

    #[test]
    fn jpeg_quality_range_checked() {
        assert!(VideoConfig::builder()
            .frame_format(FrameFormat::Jpeg { quality: 0 })
            .build()
            .is_err());
        assert!(VideoConfig::builder()
            .frame_format(FrameFormat::Jpeg { quality: 100 })
            .build()
            .is_ok());
    }

    #[test]
    fn auto_viewport_rounds_up_to_even() {
        let config = VideoConfig::builder()
            .resolution(Dimension::Auto, Dimension::Auto)
            .build()
            .unwrap();
        let vp = config.resolve_viewport((613, 791)).unwrap();
        assert_eq!((vp.width, vp.height), (614, 792));
    }

    #[test]
    fn auto_applies_per_axis() {
        let config = VideoConfig::builder()
            .resolution(Dimension::Pixels(640), Dimension::Auto)
            .build()
            .unwrap();
        let vp = config.resolve_viewport((1000, 500)).unwrap();
        assert_eq!((vp.width, vp.height), (640, 500));
    }

    #[test]
    fn dimension_parsing() {
        assert_eq!("auto".parse::<Dimension>().unwrap(), Dimension::Auto);
        assert_eq!("AUTO".parse::<Dimension>().unwrap(), Dimension::Auto);
        assert_eq!("-1".parse::<Dimension>().unwrap(), Dimension::Auto);
        assert_eq!("1920".parse::<Dimension>().unwrap(), Dimension::Pixels(1920));
        assert!("wide".parse::<Dimension>().is_err());
    }

    #[test]
    fn video_format_parsing_is_case_insensitive() {
        assert_eq!("MP4".parse::<VideoFormat>().unwrap(), VideoFormat::Mp4);
        assert_eq!("mkv".parse::<VideoFormat>().unwrap(), VideoFormat::Mkv);
        assert!("webm".parse::<VideoFormat>().is_err());
        assert_eq!(VideoFormat::Mov.extension(), "mov");
    }

    #[test]
    fn frames_per_item() {
        let vp = Viewport::new(100, 50, 30.0, 2.5, VideoFormat::Mp4).unwrap();
        assert_eq!(vp.frames_per_item(), 75.0);
    }

    #[test]
    fn debug_redacts_password() {
        let config = VideoConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }
}
