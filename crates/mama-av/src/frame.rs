//! Single-frame extraction from video files.
//!
//! The transform pipeline only needs "give me frame N of this file as an
//! encoded still image", which [`FrameExtractor`] captures. The production
//! implementation pipes one MJPEG frame out of the `ffmpeg` CLI.

use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Source of still frames for snapshot transforms.
pub trait FrameExtractor: Send + Sync {
    /// Extract frame `frame_number` (1-based) of the video at `path` as
    /// encoded image bytes.
    fn extract_frame(&self, path: &Path, frame_number: u32) -> Result<Vec<u8>>;
}

/// [`FrameExtractor`] backed by the `ffmpeg` command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    program: PathBuf,
}

impl FfmpegFrameExtractor {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }

    /// Use a specific ffmpeg binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn extract_frame(&self, path: &Path, frame_number: u32) -> Result<Vec<u8>> {
        if !path.is_file() {
            return Err(Error::file_not_found(path));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Extracting frame {} from {:?}", frame_number, path);

        let output = Command::new(&self.program)
            .args(snapshot_args(path, frame_number))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found("ffmpeg")
                } else {
                    Error::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool: "ffmpeg".to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // ffmpeg succeeds with no output when the select filter never matches.
        if output.stdout.is_empty() {
            return Err(Error::NoFrame {
                path: path.to_path_buf(),
                frame: frame_number,
            });
        }

        Ok(output.stdout)
    }
}

/// Arguments selecting the first frame with index >= `frame_number` and
/// writing it to stdout as a single MJPEG image.
pub fn snapshot_args(path: &Path, frame_number: u32) -> Vec<OsString> {
    let frame_number = frame_number.max(1);
    let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_owned());
    for arg in [
        "-vf".to_string(),
        format!("select=gte(n\\,{frame_number})"),
        "-vframes".to_string(),
        "1".to_string(),
        "-f".to_string(),
        "image2".to_string(),
        "-vcodec".to_string(),
        "mjpeg".to_string(),
        "pipe:1".to_string(),
    ] {
        args.push(OsString::from(arg));
    }
    args
}
