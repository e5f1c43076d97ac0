//! Tuning knobs for the encode and decode paths.
//!
//! Defaults match the protocol constants. Each knob can be overridden from the
//! environment (`QRT_*`) and then again by explicit CLI flags.

use crate::error::{Result, TransferError};
use crate::wire::CHUNK_SIZE;

fn parse_env_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
}

fn parse_env_usize(name: &str) -> Option<usize> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
}

fn parse_env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
}

fn parse_env_bool_u8(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
}

/// Decode-side settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeConfig {
    /// Frames sampled per second of video.
    pub fps: u32,
    /// Signature distance at or above which a radical change is declared.
    pub change_threshold: f64,
    /// Side of the signature grid.
    pub analysis_size: usize,
    /// Frames sampled per segment (0 means the default of 4, minimum 3).
    pub decode_window: usize,
    /// Runs shorter than this are transient: decoded, but a miss or a
    /// repeat there is not counted against the transfer.
    pub min_segment_frames: usize,
    /// Fraction of the shorter side used for the signature crop.
    pub crop_ratio: f64,
    /// Decode sampled frames on the rayon pool.
    pub parallel: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            fps: 6,
            change_threshold: 0.10,
            analysis_size: 64,
            decode_window: 4,
            min_segment_frames: 2,
            crop_ratio: 0.85,
            parallel: true,
        }
    }
}

impl DecodeConfig {
    /// Apply `QRT_FPS`, `QRT_THRESHOLD`, `QRT_ANALYSIS_SIZE`,
    /// `QRT_DECODE_WINDOW` and `QRT_PARALLEL` when set and parsable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(fps) = parse_env_u32("QRT_FPS") {
            self.fps = fps;
        }
        if let Some(threshold) = parse_env_f64("QRT_THRESHOLD") {
            self.change_threshold = threshold;
        }
        if let Some(size) = parse_env_usize("QRT_ANALYSIS_SIZE") {
            self.analysis_size = size;
        }
        if let Some(window) = parse_env_usize("QRT_DECODE_WINDOW") {
            self.decode_window = window;
        }
        if let Some(parallel) = parse_env_bool_u8("QRT_PARALLEL") {
            self.parallel = parallel;
        }
        self
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(TransferError::InvalidInput("fps must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.change_threshold) {
            return Err(TransferError::InvalidInput(
                "threshold must be between 0 and 1".into(),
            ));
        }
        if self.analysis_size < 8 {
            return Err(TransferError::InvalidInput(
                "analysis size must be >= 8".into(),
            ));
        }
        if !(self.crop_ratio > 0.0 && self.crop_ratio <= 1.0) {
            return Err(TransferError::InvalidInput(
                "crop ratio must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Encode-side settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Side of the square slide canvas in pixels.
    pub canvas_side: u32,
    /// Code points per data chunk.
    pub chunk_size: usize,
    /// Delay between slides during playback.
    pub slide_delay_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_side: 1080,
            chunk_size: CHUNK_SIZE,
            slide_delay_ms: 1250,
        }
    }
}

impl RenderConfig {
    /// Apply `QRT_CANVAS_SIDE` when set and parsable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(side) = parse_env_u32("QRT_CANVAS_SIDE") {
            self.canvas_side = side;
        }
        self
    }

    /// Reject values the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.canvas_side < 64 {
            return Err(TransferError::InvalidInput(
                "canvas side must be >= 64 pixels".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(TransferError::InvalidInput(
                "chunk size must be > 0".into(),
            ));
        }
        Ok(())
    }
}
