//! Video encoding: hand a finished frames directory to an external `ffmpeg`.
//!
//! ## Why an external process?
//!
//! Linking libav* would pull native headers and a C toolchain into every
//! build for one call. The frames are already on disk under a `%06d`
//! pattern, which is exactly what the ffmpeg image demuxer reads.
//!
//! ## Pacing
//!
//! `-framerate` sets how fast frame files are consumed and `-r` the rate
//! of the written stream. Sequence style writes one file per page and reads
//! them at `1 / seconds_per_page`, so ffmpeg duplicates each page for its
//! display time. Scroll style reads at `fps` because every file is already
//! a distinct frame.
//!
//! The output path is never overwritten (`-n`); callers pick a free name
//! first.

use crate::config::Style;
use crate::error::Pdf2VideoError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::{debug, info};

/// Everything the encoder needs to know about one run.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeJob {
    /// Executable to run, normally `ffmpeg`.
    pub program: String,
    /// Frames consumed per second of video.
    pub input_rate: f64,
    /// Frame rate of the written stream.
    pub output_fps: f64,
    /// `{frames_dir}/%06d.{ext}`.
    pub input_pattern: PathBuf,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

impl EncodeJob {
    /// Input rate for a style: `1 / seconds_per_page` for sequence, `fps`
    /// for scroll.
    pub fn input_rate_for(style: Style, fps: f64, seconds_per_page: f64) -> f64 {
        match style {
            Style::Sequence => 1.0 / seconds_per_page,
            Style::Scroll => fps,
        }
    }

    /// Command-line arguments, without the program name.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-loglevel".into(),
            "error".into(),
            "-n".into(),
            "-framerate".into(),
            self.input_rate.to_string(),
            "-i".into(),
            self.input_pattern.to_string_lossy().into_owned(),
            "-s".into(),
            format!("{}x{}", self.width, self.height),
            "-r".into(),
            self.output_fps.to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            self.output.to_string_lossy().into_owned(),
        ]
    }
}

/// Run the encoder to completion.
///
/// A missing executable is [`Pdf2VideoError::EncoderNotFound`]; a non-zero
/// exit is [`Pdf2VideoError::EncoderFailed`] carrying ffmpeg's stderr and
/// the frames directory so the caller can keep it for a retry.
pub async fn run_encoder(job: &EncodeJob, frames_dir: &Path) -> Result<(), Pdf2VideoError> {
    let args = job.args();
    info!(
        "Encoding {} → {} ({}x{})",
        job.input_pattern.display(),
        job.output.display(),
        job.width,
        job.height
    );
    debug!("{} {}", job.program, args.join(" "));

    let output = tokio::process::Command::new(&job.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                Pdf2VideoError::EncoderNotFound {
                    program: job.program.clone(),
                    detail: e.to_string(),
                }
            }
            _ => Pdf2VideoError::Internal(format!("failed to run {}: {}", job.program, e)),
        })?;

    if !output.status.success() {
        return Err(Pdf2VideoError::EncoderFailed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            frames_dir: frames_dir.to_path_buf(),
        });
    }

    info!("Wrote {}", job.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(program: &str) -> EncodeJob {
        EncodeJob {
            program: program.into(),
            input_rate: 0.5,
            output_fps: 24.0,
            input_pattern: PathBuf::from("/tmp/frames/%06d.jpg"),
            width: 1280,
            height: 720,
            output: PathBuf::from("/tmp/out.mp4"),
        }
    }

    #[test]
    fn args_follow_input_then_output_order() {
        let args = job("ffmpeg").args();
        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-framerate") + 1], "0.5");
        assert_eq!(args[pos("-i") + 1], "/tmp/frames/%06d.jpg");
        assert_eq!(args[pos("-s") + 1], "1280x720");
        assert_eq!(args[pos("-r") + 1], "24");
        assert!(pos("-framerate") < pos("-i"));
        assert!(pos("-i") < pos("-s"));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
        assert!(args.contains(&"-n".to_string()));
    }

    #[test]
    fn input_rate_depends_on_style() {
        assert_eq!(EncodeJob::input_rate_for(Style::Sequence, 30.0, 4.0), 0.25);
        assert_eq!(EncodeJob::input_rate_for(Style::Scroll, 30.0, 4.0), 30.0);
    }

    #[tokio::test]
    async fn missing_program_is_reported() {
        let err = run_encoder(&job("pdf2video-no-such-encoder"), Path::new("/tmp/frames"))
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2VideoError::EncoderNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_keeps_frames_dir() {
        let err = run_encoder(&job("false"), Path::new("/tmp/frames"))
            .await
            .unwrap_err();
        match err {
            Pdf2VideoError::EncoderFailed { frames_dir, .. } => {
                assert_eq!(frames_dir, PathBuf::from("/tmp/frames"))
            }
            other => panic!("expected EncoderFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_is_success() {
        run_encoder(&job("true"), Path::new("/tmp/frames")).await.unwrap();
    }
}
