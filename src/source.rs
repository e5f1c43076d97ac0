//! Video to still frames.
//!
//! Extraction is delegated to a `FrameExtractor` that writes `frame_*.png`
//! files whose lexicographic order is their temporal order. `FrameReader`
//! then loads them lazily, one image at a time.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use crate::error::{Result, TransferError};
use crate::models::Frame;

/// File name prefix of extracted frames.
pub const FRAME_PREFIX: &str = "frame_";
/// File name suffix of extracted frames.
pub const FRAME_SUFFIX: &str = ".png";

/// Turns a video into PNG frames inside `out_dir`.
pub trait FrameExtractor {
    /// Write frames sampled at `fps` into `out_dir`.
    fn extract(&self, video: &Path, out_dir: &Path, fps: u32) -> Result<()>;
}

/// Extractor backed by the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: PathBuf,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
        }
    }
}

impl FfmpegExtractor {
    /// Use a specific `ffmpeg` binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Argument list passed to ffmpeg.
    pub fn arguments(video: &Path, out_dir: &Path, fps: u32) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            video.display().to_string(),
            "-vf".into(),
            format!("fps={fps}"),
            out_dir.join("frame_%08d.png").display().to_string(),
        ]
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn extract(&self, video: &Path, out_dir: &Path, fps: u32) -> Result<()> {
        let tool = self.program.display().to_string();
        let args = Self::arguments(video, out_dir, fps);
        debug!(%tool, ?args, "running frame extractor");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| TransferError::ExternalTool {
                tool: tool.clone(),
                output: e.to_string(),
            })?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(TransferError::ExternalTool {
                tool,
                output: format!("{} ({})", text.trim(), output.status),
            });
        }
        Ok(())
    }
}

/// Extracted frame files in `dir`, sorted by name.
///
/// Fails with `ExternalTool` when the extractor produced nothing.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FRAME_PREFIX) && n.ends_with(FRAME_SUFFIX))
        })
        .collect();
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if frames.is_empty() {
        return Err(TransferError::ExternalTool {
            tool: "frame extractor".into(),
            output: format!("no frames produced in {}", dir.display()),
        });
    }
    info!(frames = frames.len(), dir = %dir.display(), "frames listed");
    Ok(frames)
}

/// Lazily loads frames in order.
///
/// Unreadable images are skipped with a warning; the ordinal index still
/// advances so frame numbers match file positions.
#[derive(Debug)]
pub struct FrameReader {
    paths: std::vec::IntoIter<PathBuf>,
    next_index: usize,
}

impl FrameReader {
    /// Reader over already listed frame files.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths: paths.into_iter(),
            next_index: 0,
        }
    }

    /// Reader over every frame file in `dir`.
    pub fn open_dir(dir: &Path) -> Result<Self> {
        Ok(Self::new(list_frames(dir)?))
    }
}

impl Iterator for FrameReader {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        for path in self.paths.by_ref() {
            let index = self.next_index;
            self.next_index += 1;
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match image::open(&path) {
                Ok(img) => return Some(Frame::new(index, label, img.to_rgb8())),
                Err(e) => warn!(frame = %label, error = %e, "skipping unreadable frame"),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.paths.len()))
    }
}
