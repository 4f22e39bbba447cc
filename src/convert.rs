//! Conversion entry points: source in, video out.
//!
//! ## Stages
//!
//! 1. **Load** — render the document or decode the image directory, resolve
//!    the viewport, and bring every item to its per-style size with even
//!    dimensions.
//! 2. **Frames** — compose one frame per item (sequence) or stitch and
//!    window (scroll), writing each frame under its pre-assigned index.
//! 3. **Encode** — run the external encoder over the frames directory.
//!
//! ## Why pre-assign indices?
//!
//! Frames are written by concurrent blocking tasks and finish in any order.
//! Each task receives its index before it starts and writes only that file,
//! so the directory is contiguous from `000000` no matter how the tasks
//! are scheduled.
//!
//! ## Frames directory lifecycle
//!
//! | outcome                    | frames directory          |
//! |----------------------------|---------------------------|
//! | failure before encoding    | deleted                   |
//! | encoder failure            | kept, path in the error   |
//! | success, `keep_frames`     | kept, path in the output  |
//! | success                    | deleted                   |

use crate::config::{Style, VideoConfig, Viewport};
use crate::error::{PageError, Pdf2VideoError};
use crate::output::{ConversionOutput, ConversionStats, SourceMetadata};
use crate::pipeline::frames::{self, FramesDir};
use crate::pipeline::load::{self, SequenceEntry};
use crate::pipeline::{compose, encode, fit, input, parity, render, scroll};
use crate::pipeline::input::SourceInput;
use futures::stream::{self, StreamExt, TryStreamExt};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sources after loading: sized for the viewport, even, in display order.
struct LoadedSource {
    viewport: Viewport,
    items: Vec<DynamicImage>,
    skipped: Vec<PageError>,
    metadata: SourceMetadata,
}

/// What the frames stage produced.
struct FrameSet {
    frame_count: usize,
    stride: Option<u32>,
}

/// Convert a PDF document or an image directory into a video.
///
/// Directories are treated as image sequences, anything else as a PDF.
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some items were skipped
/// (check `output.stats.skipped`).
///
/// # Errors
/// Returns `Err(Pdf2VideoError)` only for fatal errors:
/// - source missing, unreadable or not a PDF
/// - no usable items
/// - invalid viewport
/// - any frame or directory I/O failure
/// - encoder missing or failing (frames are kept in that case)
pub async fn convert(
    source_path: impl AsRef<Path>,
    config: &VideoConfig,
) -> Result<ConversionOutput, Pdf2VideoError> {
    let source = input::resolve_input(source_path.as_ref())?;
    convert_source(&source, config).await
}

/// Convert an already validated source.
pub async fn convert_source(
    source: &SourceInput,
    config: &VideoConfig,
) -> Result<ConversionOutput, Pdf2VideoError> {
    let total_start = Instant::now();
    info!(
        "Starting conversion: {} ({}, {} style)",
        source.path().display(),
        source.kind(),
        config.style
    );

    // ── Step 1: Load and size the items ──────────────────────────────────
    let load_start = Instant::now();
    let loaded = load_source(source, config).await?;
    let load_duration_ms = load_start.elapsed().as_millis() as u64;
    let vp = loaded.viewport;
    info!(
        "Loaded {} items for {}x{} in {}ms ({} skipped)",
        loaded.items.len(),
        vp.width,
        vp.height,
        load_duration_ms,
        loaded.skipped.len()
    );

    // ── Step 2: Pick the output path ─────────────────────────────────────
    let output_path = resolve_output_path(source, config)?;

    // ── Step 3: Write frames ─────────────────────────────────────────────
    let parent = config
        .frames_parent
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let frames_dir = FramesDir::create(&parent)?;
    let frames_start = Instant::now();
    let items_used = loaded.items.len();
    let frame_set = write_frames(loaded.items, &vp, config, &frames_dir).await?;
    let frames_duration_ms = frames_start.elapsed().as_millis() as u64;
    info!(
        "Wrote {} frames in {}ms",
        frame_set.frame_count, frames_duration_ms
    );

    // ── Step 4: Encode ───────────────────────────────────────────────────
    let job = encode::EncodeJob {
        program: config.encoder_program.clone(),
        input_rate: encode::EncodeJob::input_rate_for(config.style, vp.fps, vp.seconds_per_page),
        output_fps: vp.fps,
        input_pattern: frames_dir.input_pattern(config.frame_format),
        width: vp.width,
        height: vp.height,
        output: output_path.clone(),
    };
    if let Some(cb) = &config.progress_callback {
        cb.on_encode_start(&output_path);
    }
    let encode_start = Instant::now();
    if let Err(e) = encode::run_encoder(&job, frames_dir.path()).await {
        if matches!(e, Pdf2VideoError::EncoderFailed { .. }) {
            frames_dir.keep();
        }
        return Err(e);
    }
    let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

    let kept_frames = if config.keep_frames {
        Some(frames_dir.keep())
    } else {
        frames_dir.remove()?;
        None
    };

    // ── Step 5: Stats ────────────────────────────────────────────────────
    let stats = ConversionStats {
        style: config.style,
        viewport: vp,
        items_used,
        skipped: loaded.skipped,
        frame_count: frame_set.frame_count,
        stride: frame_set.stride,
        duration_secs: ConversionStats::expected_duration(config.style, &vp, frame_set.frame_count),
        load_duration_ms,
        frames_duration_ms,
        encode_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} frames → {} ({}ms total)",
        stats.frame_count,
        output_path.display(),
        stats.total_duration_ms
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_conversion_complete(stats.frame_count, &output_path);
    }

    Ok(ConversionOutput {
        output_path,
        frames_dir: kept_frames,
        source: loaded.metadata,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    source_path: impl AsRef<Path>,
    config: &VideoConfig,
) -> Result<ConversionOutput, Pdf2VideoError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2VideoError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source_path, config))
}

/// Describe a source without generating frames.
///
/// Does not require the encoder.
pub async fn inspect(
    source: &SourceInput,
    password: Option<&str>,
) -> Result<SourceMetadata, Pdf2VideoError> {
    match source {
        SourceInput::Document(path) => {
            let info = render::inspect_document(path, password).await?;
            Ok(SourceMetadata {
                path: path.clone(),
                kind: source.kind().to_string(),
                item_count: info.page_count,
                first_item_size: info
                    .first_page_points
                    .map(|(w, h)| (w.round() as u32, h.round() as u32)),
                title: info.title,
                author: info.author,
                pdf_version: Some(info.pdf_version),
            })
        }
        SourceInput::ImageDir(path) => {
            let dir = path.clone();
            let (item_count, first_item_size) = blocking(move || {
                load::scan_directory(&dir)
                    .map(|(entries, _)| (entries.len(), load::first_native_size(&entries)))
            })
            .await??;
            Ok(SourceMetadata {
                path: path.clone(),
                kind: source.kind().to_string(),
                item_count,
                first_item_size,
                title: None,
                author: None,
                pdf_version: None,
            })
        }
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn blocking<T, F>(f: F) -> Result<T, Pdf2VideoError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Pdf2VideoError::Internal(format!("Blocking task panicked: {}", e)))
}

fn resolve_output_path(
    source: &SourceInput,
    config: &VideoConfig,
) -> Result<PathBuf, Pdf2VideoError> {
    let wanted = config
        .output
        .clone()
        .unwrap_or_else(|| input::default_output_path(source, config.format));
    if let Some(parent) = wanted.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Pdf2VideoError::filesystem(parent, e))?;
    }
    Ok(input::disambiguate(&wanted))
}

fn report_skipped(config: &VideoConfig, skipped: &[PageError]) {
    if let Some(cb) = &config.progress_callback {
        for err in skipped {
            cb.on_item_skipped(&err.to_string());
        }
    }
}

async fn load_source(
    source: &SourceInput,
    config: &VideoConfig,
) -> Result<LoadedSource, Pdf2VideoError> {
    let loaded = match source {
        SourceInput::Document(path) => load_document(path, config).await?,
        SourceInput::ImageDir(path) => load_image_dir(path, config).await?,
    };
    report_skipped(config, &loaded.skipped);

    if loaded.items.is_empty() {
        return Err(Pdf2VideoError::EmptySource {
            path: source.path().to_path_buf(),
            skipped: loaded.skipped.len(),
        });
    }
    Ok(loaded)
}

/// Bring a freshly rendered page to its final size.
///
/// Pages are rendered at the right density already; only rounding
/// overshoot (sequence) or width drift (scroll) is corrected.
fn size_rendered_page(
    img: &DynamicImage,
    vp: &Viewport,
    style: Style,
) -> Result<DynamicImage, Pdf2VideoError> {
    let sized = match style {
        Style::Sequence => fit::clamp_to_viewport(img, vp)?,
        Style::Scroll => fit::fit_to_width(img, vp.width)?,
    };
    Ok(parity::sanitize(&sized))
}

/// Bring a decoded image to its final size.
fn size_loaded_image(
    img: &DynamicImage,
    vp: &Viewport,
    style: Style,
) -> Result<DynamicImage, Pdf2VideoError> {
    let sized = match style {
        Style::Sequence => fit::fit_to_viewport(img, vp)?,
        Style::Scroll => fit::fit_to_width(img, vp.width)?,
    };
    Ok(parity::sanitize(&sized))
}

async fn load_document(path: &Path, config: &VideoConfig) -> Result<LoadedSource, Pdf2VideoError> {
    let render::RenderedDocument {
        viewport: vp,
        pages,
        mut skipped,
        page_count,
        native_size,
    } = render::render_document(path, config).await?;
    let style = config.style;

    let sized = blocking(move || {
        pages
            .into_iter()
            .map(|(idx, img)| {
                size_rendered_page(&img, &vp, style).map_err(|e| PageError::RenderFailed {
                    page: idx + 1,
                    detail: e.to_string(),
                })
            })
            .collect::<Vec<_>>()
    })
    .await?;

    let mut items = Vec::with_capacity(sized.len());
    for result in sized {
        match result {
            Ok(img) => items.push(img),
            Err(err) => {
                warn!("Skipping {}", err);
                skipped.push(err);
            }
        }
    }

    Ok(LoadedSource {
        viewport: vp,
        items,
        skipped,
        metadata: SourceMetadata {
            path: path.to_path_buf(),
            kind: "document".into(),
            item_count: page_count,
            first_item_size: Some(native_size),
            title: None,
            author: None,
            pdf_version: None,
        },
    })
}

async fn load_image_dir(dir: &Path, config: &VideoConfig) -> Result<LoadedSource, Pdf2VideoError> {
    let scan_dir = dir.to_path_buf();
    let (entries, mut skipped) = blocking(move || load::scan_directory(&scan_dir)).await??;
    let total = entries.len();
    if let Some(cb) = &config.progress_callback {
        cb.on_conversion_start(total);
    }

    let probe = entries.clone();
    let native = blocking(move || load::first_native_size(&probe))
        .await?
        .ok_or_else(|| Pdf2VideoError::EmptySource {
            path: dir.to_path_buf(),
            skipped: skipped.len() + total,
        })?;
    let vp = config.resolve_viewport(native)?;
    let style = config.style;
    info!(
        "Loading {} images for {}x{} viewport ({} style)",
        total, vp.width, vp.height, style
    );

    // `buffered` keeps display order while decoding in parallel.
    let progress = config.progress_callback.clone();
    let results: Vec<Result<Result<DynamicImage, PageError>, Pdf2VideoError>> =
        stream::iter(entries.into_iter().enumerate())
            .map(|(pos, entry): (usize, SequenceEntry)| {
                let progress = progress.clone();
                blocking(move || -> Result<DynamicImage, PageError> {
                    let img = load::load_image(&entry)?;
                    let sized = size_loaded_image(&img, &vp, style).map_err(|e| {
                        PageError::DecodeFailed {
                            path: entry.path.clone(),
                            detail: e.to_string(),
                        }
                    })?;
                    if let Some(cb) = &progress {
                        cb.on_item_loaded(pos + 1, total);
                    }
                    Ok(sized)
                })
            })
            .buffered(config.concurrency.max(1))
            .collect()
            .await;

    let mut items = Vec::with_capacity(results.len());
    for result in results {
        match result? {
            Ok(img) => items.push(img),
            Err(err) => {
                warn!("Skipping {}", err);
                skipped.push(err);
            }
        }
    }

    Ok(LoadedSource {
        viewport: vp,
        items,
        skipped,
        metadata: SourceMetadata {
            path: dir.to_path_buf(),
            kind: "image_sequence".into(),
            item_count: total,
            first_item_size: Some(native),
            title: None,
            author: None,
            pdf_version: None,
        },
    })
}

/// Write every frame of the run into `frames_dir`.
async fn write_frames(
    items: Vec<DynamicImage>,
    vp: &Viewport,
    config: &VideoConfig,
    frames_dir: &FramesDir,
) -> Result<FrameSet, Pdf2VideoError> {
    match config.style {
        Style::Sequence => {
            let frame_count = items.len();
            frames::check_frame_count(frame_count)?;
            let items = Arc::new(items);
            let background = config.background;
            let vp = *vp;
            write_indexed(frame_count, &vp, config, frames_dir, move |index| {
                compose::compose_frame(&items[index], &vp, background)
            })
            .await?;
            Ok(FrameSet {
                frame_count,
                stride: None,
            })
        }
        Style::Scroll => {
            let background = config.background;
            let stitch_vp = *vp;
            let item_count = items.len();
            let composite =
                blocking(move || scroll::stitch(&items, &stitch_vp, background)).await??;
            let plan = scroll::ScrollPlan::new(composite.height(), item_count, vp)?;
            info!(
                "Scroll plan: {} frames, stride {} px over {} px",
                plan.frame_count, plan.stride, plan.usable_height
            );
            frames::check_frame_count(plan.frame_count)?;

            let composite = Arc::new(composite);
            let vp = *vp;
            write_indexed(plan.frame_count, &vp, config, frames_dir, move |index| {
                scroll::window(&composite, plan.offset(index), &vp)
            })
            .await?;
            Ok(FrameSet {
                frame_count: plan.frame_count,
                stride: Some(plan.stride),
            })
        }
    }
}

/// Produce and write frames `0..frame_count` with bounded concurrency.
///
/// `make_frame` builds the frame for an index; it runs on the blocking pool.
async fn write_indexed<F>(
    frame_count: usize,
    vp: &Viewport,
    config: &VideoConfig,
    frames_dir: &FramesDir,
    make_frame: F,
) -> Result<(), Pdf2VideoError>
where
    F: Fn(usize) -> DynamicImage + Send + Sync + 'static,
{
    if let Some(cb) = &config.progress_callback {
        cb.on_frames_start(frame_count);
    }

    let format = config.frame_format;
    let paths = (0..frame_count)
        .map(|index| frames_dir.frame_path(index, format))
        .collect::<Result<Vec<_>, _>>()?;

    // `try_for_each_concurrent` stops pulling indices at the first failure;
    // frames already in flight finish, nothing new is started.
    let make_frame = Arc::new(make_frame);
    let vp = *vp;
    stream::iter(paths.into_iter().enumerate().map(Ok::<_, Pdf2VideoError>))
        .try_for_each_concurrent(config.concurrency.max(1), |(index, path)| {
            let make_frame = Arc::clone(&make_frame);
            let progress = config.progress_callback.clone();
            async move {
                blocking(move || -> Result<(), Pdf2VideoError> {
                    let frame = make_frame(index);
                    frames::write_frame(&frame, &path, format, &vp)?;
                    debug!("Wrote frame {}", path.display());
                    if let Some(cb) = &progress {
                        cb.on_frame_written(index, frame_count);
                    }
                    Ok(())
                })
                .await?
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FrameFormat, VideoFormat};
    use image::{GenericImageView, Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn vp(w: u32, h: u32) -> Viewport {
        Viewport::new(w, h, 1.0, 1.0, VideoFormat::Mp4).unwrap()
    }

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([90, 90, 90])))
    }

    #[test]
    fn rendered_overshoot_is_clamped_and_even() {
        let v = vp(1280, 720);
        let out = size_rendered_page(&solid(1281, 721), &v, Style::Sequence).unwrap();
        assert_eq!(out.dimensions(), (1280, 720));
    }

    #[test]
    fn rendered_page_that_fits_is_only_padded() {
        let v = vp(1280, 720);
        let out = size_rendered_page(&solid(1279, 719), &v, Style::Sequence).unwrap();
        assert_eq!(out.dimensions(), (1280, 720));
        let out = size_rendered_page(&solid(507, 719), &v, Style::Sequence).unwrap();
        assert_eq!(out.dimensions(), (508, 720));
    }

    #[test]
    fn rendered_scroll_page_takes_viewport_width() {
        let v = vp(1280, 720);
        let out = size_rendered_page(&solid(1279, 1809), &v, Style::Scroll).unwrap();
        assert_eq!(out.width(), 1280);
        assert_eq!(out.height() % 2, 0);
        assert!((1808..=1812).contains(&out.height()), "got {}", out.height());
    }

    #[test]
    fn rendered_page_of_zero_size_is_rejected() {
        let empty = DynamicImage::new_rgb8(0, 0);
        assert!(size_rendered_page(&empty, &vp(1280, 720), Style::Scroll).is_err());
    }

    #[tokio::test]
    async fn frame_write_failure_stops_remaining_frames() {
        let parent = tempfile::tempdir().unwrap();
        let frames_dir = FramesDir::create(parent.path()).unwrap();
        let config = VideoConfig::builder()
            .frame_format(FrameFormat::Png)
            .concurrency(1)
            .build()
            .unwrap();
        let v = vp(8, 4);

        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let result = write_indexed(50, &v, &config, &frames_dir, move |index| {
            counter.fetch_add(1, Ordering::SeqCst);
            if index == 0 {
                solid(3, 3)
            } else {
                solid(8, 4)
            }
        })
        .await;

        assert!(result.is_err());
        assert!(built.load(Ordering::SeqCst) < 50, "every frame was still built");
        let written = std::fs::read_dir(frames_dir.path()).unwrap().count();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn all_frames_written_when_nothing_fails() {
        let parent = tempfile::tempdir().unwrap();
        let frames_dir = FramesDir::create(parent.path()).unwrap();
        let config = VideoConfig::builder()
            .frame_format(FrameFormat::Png)
            .concurrency(4)
            .build()
            .unwrap();
        let v = vp(8, 4);

        write_indexed(12, &v, &config, &frames_dir, |_| solid(8, 4))
            .await
            .unwrap();

        let mut names: Vec<String> = std::fs::read_dir(frames_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 12);
        assert_eq!(names.first().map(String::as_str), Some("000000.png"));
        assert_eq!(names.last().map(String::as_str), Some("000011.png"));
    }
}
