//! CLI binary for edgequake-pdf2video.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `VideoConfig`, confirms the run and prints results.

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use edgequake_pdf2video::{
    convert_source, inspect, resolve_document, resolve_image_dir, ConversionProgressCallback,
    Dimension, FrameFormat, SourceInput, Style, VideoConfig, VideoFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar that is re-targeted for each phase
/// (loading items, writing frames, encoding).
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(Self::spinner_style());
        bar.set_prefix("Preparing");
        bar.set_message("Opening source…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    /// Switch to a counting bar for a phase of `total` steps.
    fn start_phase(&self, prefix: &'static str, unit: &str, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>5}}/{{len}} {unit}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}"
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_items: usize) {
        self.start_phase("Loading", "items", total_items);
    }

    fn on_item_loaded(&self, _item_num: usize, _total_items: usize) {
        self.bar.inc(1);
    }

    fn on_item_skipped(&self, error: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!("  {} {}", yellow("⚠"), dim(error)));
    }

    fn on_frames_start(&self, total_frames: usize) {
        self.start_phase("Frames", "frames", total_frames);
    }

    fn on_frame_written(&self, _frame_index: usize, _total_frames: usize) {
        self.bar.inc(1);
    }

    fn on_encode_start(&self, output: &Path) {
        self.bar.set_style(Self::spinner_style());
        self.bar.set_prefix("Encoding");
        self.bar.set_message(output.display().to_string());
    }

    fn on_conversion_complete(&self, total_frames: usize, output: &Path) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        let note = if skipped > 0 {
            format!("  ({} items skipped)", yellow(&skipped.to_string()))
        } else {
            String::new()
        };
        eprintln!(
            "{} {} frames  →  {}{}",
            green("✔"),
            bold(&total_frames.to_string()),
            bold(&output.display().to_string()),
            note
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Slideshow, one page per 3 seconds at 1280x720
  pdf2video -s 3 slides.pdf

  # Scrolling paper at 1080p, 30 fps, 8 seconds per page
  pdf2video --scroll -r 1920 1080 -f 30 -s 8 paper.pdf

  # Numbered images (1.png, 2.png, …) at their native size
  pdf2video --images shots/ -r auto auto -f 24 -s 0.5

  # Keep the generated frames next to the video
  pdf2video --keep --frames-dir ./work slides.pdf -o talk.mkv

  # Just look at the source
  pdf2video --inspect-only slides.pdf

IMAGE SEQUENCES:
  Files are ordered by the number at the start of their name. Files
  without one are skipped; gaps in the numbering are reported but never
  produce blank frames.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH     Path to the pdfium shared library
  PDF2VIDEO_FFMPEG    Encoder executable (default: ffmpeg)
  RUST_LOG            Log filter, overrides -v/-q
"#;

/// Turn PDF documents and numbered image sequences into videos.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2video",
    version,
    about = "Turn PDF documents and numbered image sequences into videos",
    long_about = "Render a PDF (or load a directory of numbered images), lay the pages out \
either as a paced slideshow or as one continuous vertical scroll, and encode the frames \
with ffmpeg.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP,
    group(ArgGroup::new("source").required(true).args(["document", "images"]))
)]
struct Cli {
    /// PDF document to convert.
    document: Option<PathBuf>,

    /// Directory of numbered images to convert instead of a document.
    #[arg(short = 'i', long, value_name = "DIR")]
    images: Option<PathBuf>,

    /// Output resolution; either value may be `auto`.
    #[arg(
        short = 'r',
        long = "resolution",
        num_args = 2,
        value_names = ["WIDTH", "HEIGHT"],
        allow_hyphen_values = true,
        default_values = ["1280", "720"]
    )]
    resolution: Vec<Dimension>,

    /// Frames per second of the output video.
    #[arg(short = 'f', long, env = "PDF2VIDEO_FPS", default_value_t = 1.0)]
    fps: f64,

    /// Seconds each page stays on screen.
    #[arg(short = 's', long, env = "PDF2VIDEO_SECONDS_PER_PAGE", default_value_t = 1.0)]
    seconds_per_page: f64,

    /// Container format: mp4, avi, mkv, mov.
    #[arg(long, env = "PDF2VIDEO_FORMAT", default_value = "mp4")]
    format: VideoFormat,

    /// Scroll through all pages instead of showing them one at a time.
    #[arg(long, env = "PDF2VIDEO_SCROLL")]
    scroll: bool,

    /// Keep the frames directory after encoding.
    #[arg(long, env = "PDF2VIDEO_KEEP")]
    keep: bool,

    /// Where the frames directory is created (default: system temp dir).
    #[arg(long, env = "PDF2VIDEO_FRAMES_DIR", value_name = "DIR")]
    frames_dir: Option<PathBuf>,

    /// Output video path (default: beside the input, named after it).
    #[arg(short, long, env = "PDF2VIDEO_OUTPUT")]
    output: Option<PathBuf>,

    /// Frame file codec: jpeg or png.
    #[arg(long, env = "PDF2VIDEO_FRAME_FORMAT", value_enum, default_value = "jpeg")]
    frame_format: FrameFormatArg,

    /// JPEG quality for frame files (1–100).
    #[arg(long, env = "PDF2VIDEO_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Canvas colour as RRGGBB hex.
    #[arg(long, env = "PDF2VIDEO_BACKGROUND", default_value = "000000",
          value_parser = parse_hex_color)]
    background: [u8; 3],

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2VIDEO_PASSWORD")]
    password: Option<String>,

    /// Number of frames composed and written in parallel.
    #[arg(short, long, env = "PDF2VIDEO_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Encoder executable.
    #[arg(long, env = "PDF2VIDEO_FFMPEG", default_value = "ffmpeg")]
    ffmpeg: String,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long, env = "PDF2VIDEO_YES")]
    yes: bool,

    /// Print run statistics as JSON on stdout.
    #[arg(long, env = "PDF2VIDEO_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2VIDEO_NO_PROGRESS")]
    no_progress: bool,

    /// Describe the source only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2VIDEO_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2VIDEO_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FrameFormatArg {
    Jpeg,
    Png,
}

fn parse_hex_color(s: &str) -> Result<[u8; 3], String> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected RRGGBB hex colour, got '{s}'"));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve source ───────────────────────────────────────────────────
    let source = match (&cli.document, &cli.images) {
        (Some(doc), None) => resolve_document(doc)?,
        (None, Some(dir)) => resolve_image_dir(dir)?,
        _ => anyhow::bail!("Give either a document or --images DIR, not both"),
    };

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&source, cli.password.as_deref())
            .await
            .context("Failed to inspect source")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("Source:       {}", meta.path.display());
            println!("Kind:         {}", meta.kind);
            println!("Items:        {}", meta.item_count);
            if let Some((w, h)) = meta.first_item_size {
                println!("First item:   {}x{}", w, h);
            }
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref v) = meta.pdf_version {
                println!("PDF version:  {}", v);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let mut config = build_config(&cli)?;

    // ── Confirm ──────────────────────────────────────────────────────────
    if !cli.yes && !cli.json && io::stdin().is_terminal() && !confirm(&source, &config)? {
        eprintln!("Aborted.");
        return Ok(());
    }

    // The bar starts as a spinner; `on_conversion_start` gives it a length
    // once the source has been opened.
    if show_progress {
        config.progress_callback =
            Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>);
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert_source(&source, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &output.stats;
        if !show_progress {
            eprintln!(
                "Wrote {} frames → {}",
                stats.frame_count,
                output.output_path.display()
            );
        }
        let stride = stats
            .stride
            .map(|s| format!("  stride {s}px"))
            .unwrap_or_default();
        eprintln!(
            "   {}x{}  {:.1}s of video{}  —  {}ms total",
            stats.viewport.width,
            stats.viewport.height,
            stats.duration_secs,
            dim(&stride),
            stats.total_duration_ms,
        );
        if let Some(ref dir) = output.frames_dir {
            eprintln!("   frames kept in {}", cyan(&dir.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `VideoConfig`.
fn build_config(cli: &Cli) -> Result<VideoConfig> {
    let (width, height) = match cli.resolution.as_slice() {
        [w, h] => (*w, *h),
        other => anyhow::bail!("--resolution takes WIDTH HEIGHT, got {} values", other.len()),
    };

    let frame_format = match cli.frame_format {
        FrameFormatArg::Jpeg => FrameFormat::Jpeg {
            quality: cli.quality,
        },
        FrameFormatArg::Png => FrameFormat::Png,
    };

    let mut builder = VideoConfig::builder()
        .resolution(width, height)
        .fps(cli.fps)
        .seconds_per_page(cli.seconds_per_page)
        .format(cli.format)
        .style(if cli.scroll {
            Style::Scroll
        } else {
            Style::Sequence
        })
        .frame_format(frame_format)
        .background(cli.background)
        .keep_frames(cli.keep)
        .encoder_program(cli.ffmpeg.clone());

    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref out) = cli.output {
        builder = builder.output(out.clone());
    }
    if let Some(ref dir) = cli.frames_dir {
        builder = builder.frames_parent(dir.clone());
    }
    builder.build().context("Invalid configuration")
}

/// Show the resolved settings and ask `[Y/n]`. Empty input means yes.
fn confirm(source: &SourceInput, config: &VideoConfig) -> Result<bool> {
    let mut err = io::stderr().lock();
    writeln!(err, "{} {}", cyan("◆"), bold("About to convert"))?;
    writeln!(err, "   source      {} ({})", source.path().display(), source.kind())?;
    writeln!(err, "   style       {}", config.style)?;
    writeln!(err, "   resolution  {}x{}", config.width, config.height)?;
    writeln!(
        err,
        "   pacing      {} fps, {} s per page",
        config.fps, config.seconds_per_page
    )?;
    writeln!(err, "   format      {}", config.format.extension())?;
    if let Some(ref out) = config.output {
        writeln!(err, "   output      {}", out.display())?;
    }
    write!(err, "Proceed? [Y/n] ")?;
    err.flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colour_parses() {
        assert_eq!(parse_hex_color("ff8000").unwrap(), [255, 128, 0]);
        assert_eq!(parse_hex_color("#000000").unwrap(), [0, 0, 0]);
        assert!(parse_hex_color("fff").is_err());
        assert!(parse_hex_color("gg0000").is_err());
    }

    #[test]
    fn resolution_accepts_auto_and_minus_one() {
        let cli = Cli::try_parse_from(["pdf2video", "-r", "auto", "-1", "doc.pdf"]).unwrap();
        assert_eq!(cli.resolution, vec![Dimension::Auto, Dimension::Auto]);
    }

    #[test]
    fn document_and_images_conflict() {
        assert!(Cli::try_parse_from(["pdf2video", "doc.pdf", "--images", "dir"]).is_err());
        assert!(Cli::try_parse_from(["pdf2video", "--scroll"]).is_err());
    }

    #[test]
    fn defaults_build_a_config() {
        let cli = Cli::try_parse_from(["pdf2video", "doc.pdf"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.width, Dimension::Pixels(1280));
        assert_eq!(config.height, Dimension::Pixels(720));
        assert_eq!(config.style, Style::Sequence);
        assert_eq!(config.frame_format, FrameFormat::Jpeg { quality: 90 });
    }

    #[test]
    fn odd_resolution_is_rejected() {
        let cli = Cli::try_parse_from(["pdf2video", "-r", "1279", "720", "doc.pdf"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}
