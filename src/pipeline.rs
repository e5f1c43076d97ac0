//! Decode pipeline: video → frames → segments → chunks → file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::DecodeConfig;
use crate::decoder::{DecodeStats, RobustDecoder, RqrrReader, SegmentDecoder};
use crate::error::{Result, TransferError};
use crate::models::{DecodedChunk, Frame, Segment};
use crate::progress::{CancelToken, ProgressEvent, ProgressFn, notify};
use crate::reassembly::{ReassembledPayload, reassemble};
use crate::segmenter::{ChangeSegmenter, FrameSignature, SegmenterStats};
use crate::source::{FfmpegExtractor, FrameExtractor, FrameReader, list_frames};
use crate::wire::is_warmup;

/// File name prefix of change-frame snapshots.
pub const CHANGE_PREFIX: &str = "change_";

/// Frames whose signatures are computed together before being pushed.
const SIGNATURE_BATCH: usize = 16;

/// Counters for one decode run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeTelemetry {
    /// Frames read from the source.
    pub frames: usize,
    /// Segments handed to the decoder.
    pub segments: usize,
    /// Segments that produced no text.
    pub missed_segments: usize,
    /// Transient runs that yielded nothing new (flashes, half-drawn slides).
    pub skipped_transients: usize,
    /// Segments whose text equalled the previous one.
    pub repeated_segments: usize,
    /// Warmup segments seen.
    pub warmup_segments: usize,
    /// Data chunks kept.
    pub chunks: usize,
    /// Change segmentation counters.
    pub segmenter: SegmenterStats,
    /// Symbol decode counters.
    pub decode: DecodeStats,
}

/// Chunks recovered from a frame stream.
#[derive(Debug, Clone, Default)]
pub struct StreamOutcome {
    /// Data chunks in arrival order, warmup excluded.
    pub chunks: Vec<DecodedChunk>,
    /// Counters.
    pub telemetry: DecodeTelemetry,
}

struct StreamState<'a> {
    decoder: SegmentDecoder<RqrrReader>,
    previous: Option<String>,
    outcome: StreamOutcome,
    observer: Option<ProgressFn<'a>>,
}

impl StreamState<'_> {
    fn take_segment(&mut self, segment: Segment) {
        let telemetry = &mut self.outcome.telemetry;
        telemetry.segments += 1;
        let result = self
            .decoder
            .decode(&segment, self.previous.as_deref(), &mut telemetry.decode);

        let Some(decoded) = result.filter(|d| !(segment.transient && d.repeated)) else {
            if segment.transient {
                telemetry.skipped_transients += 1;
                debug!(segment = %segment.describe(), "transient run skipped");
            } else {
                telemetry.missed_segments += 1;
                notify(
                    self.observer,
                    ProgressEvent::SegmentDecoded {
                        ordinal: segment.ordinal,
                        frames: segment.len(),
                        text_len: None,
                    },
                );
            }
            return;
        };
        notify(
            self.observer,
            ProgressEvent::SegmentDecoded {
                ordinal: segment.ordinal,
                frames: segment.len(),
                text_len: Some(decoded.text.len()),
            },
        );
        if decoded.repeated {
            telemetry.repeated_segments += 1;
            debug!(segment = segment.ordinal, "same text as previous segment");
            return;
        }
        if is_warmup(&decoded.text) {
            telemetry.warmup_segments += 1;
            info!(segment = segment.ordinal, "warmup slide");
            self.previous = Some(decoded.text);
            return;
        }

        telemetry.chunks += 1;
        info!(
            segment = segment.ordinal,
            chunk = telemetry.chunks,
            len = decoded.text.len(),
            from = %decoded.source_label,
            "chunk decoded"
        );
        self.previous = Some(decoded.text.clone());
        self.outcome
            .chunks
            .push(DecodedChunk::new(decoded.text, decoded.source_label, segment.ordinal));
    }
}

/// Segment and decode `frames`, in order.
///
/// A segment whose text equals the previously accepted text is a repeat and
/// is skipped. The warmup slide updates the previous text but yields no
/// chunk. Transient runs are decoded too; only new text from them counts. When `snapshot_dir` is given, every frame that triggered a change
/// is saved there as `change_<NNNN>_<label>`. Cancellation is checked before
/// each frame and each segment.
pub fn decode_frame_stream<I>(
    frames: I,
    config: &DecodeConfig,
    snapshot_dir: Option<&Path>,
    observer: Option<ProgressFn<'_>>,
    cancel: &CancelToken,
) -> Result<StreamOutcome>
where
    I: IntoIterator<Item = Frame>,
{
    let mut segmenter = ChangeSegmenter::new(config);
    let mut state = StreamState {
        decoder: SegmentDecoder::new(RobustDecoder::new(), config),
        previous: None,
        outcome: StreamOutcome::default(),
        observer,
    };

    let mut frames = frames.into_iter();
    loop {
        let batch: Vec<Frame> = frames.by_ref().take(SIGNATURE_BATCH).collect();
        if batch.is_empty() {
            break;
        }
        let signatures: Vec<FrameSignature> = if config.parallel {
            batch.par_iter().map(|f| segmenter.signature_for(f)).collect()
        } else {
            batch.iter().map(|f| segmenter.signature_for(f)).collect()
        };

        for (frame, signature) in batch.into_iter().zip(signatures) {
            if cancel.is_cancelled() {
                return Err(TransferError::Cancelled);
            }
            let index = frame.index;
            state.outcome.telemetry.frames += 1;
            let pushed = segmenter.push_with_signature(frame, signature);
            notify(
                observer,
                ProgressEvent::FrameProcessed {
                    index,
                    distance: pushed.distance,
                },
            );

            if let (Some(dir), Some(change)) = (snapshot_dir, pushed.change_number) {
                if let Some(first) = segmenter.current_run().first() {
                    save_change_snapshot(dir, change, first);
                }
            }
            if let Some(segment) = pushed.segment {
                if cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }
                state.take_segment(segment);
            }
        }
    }

    if let Some(segment) = segmenter.finish() {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        state.take_segment(segment);
    }

    state.outcome.telemetry.segmenter = segmenter.stats();
    Ok(state.outcome)
}

fn save_change_snapshot(dir: &Path, change: usize, frame: &Frame) {
    let mut name = format!("{CHANGE_PREFIX}{change:04}_{}", frame.label);
    if !name.to_ascii_lowercase().ends_with(".png") {
        name.push_str(".png");
    }
    let path = dir.join(name);
    match frame.image.save(&path) {
        Ok(()) => debug!(path = %path.display(), "change frame saved"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not save change frame"),
    }
}

/// Create `dir` and delete `change_*.png` left by an earlier run.
///
/// Returns the number of files removed; other files are left alone.
pub fn prepare_frames_dir(dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir)?;
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let stale = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(CHANGE_PREFIX) && n.ends_with(".png"));
        if stale {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    if removed > 0 {
        debug!(removed, dir = %dir.display(), "stale change frames removed");
    }
    Ok(removed)
}

/// Result of a full decode run.
#[derive(Debug, Clone)]
pub struct DecodeReport {
    /// Written payload.
    pub payload: ReassembledPayload,
    /// Counters.
    pub telemetry: DecodeTelemetry,
    /// Wall time of the run.
    pub elapsed: Duration,
}

/// Video-to-file decode run.
#[derive(Debug, Clone)]
pub struct DecodePipeline<E: FrameExtractor = FfmpegExtractor> {
    config: DecodeConfig,
    extractor: E,
    cancel: CancelToken,
}

impl DecodePipeline<FfmpegExtractor> {
    /// Pipeline extracting frames with `ffmpeg`.
    pub fn new(config: DecodeConfig) -> Self {
        Self::with_extractor(config, FfmpegExtractor::default())
    }
}

impl<E: FrameExtractor> DecodePipeline<E> {
    /// Pipeline with a custom frame extractor.
    pub fn with_extractor(config: DecodeConfig, extractor: E) -> Self {
        Self {
            config,
            extractor,
            cancel: CancelToken::new(),
        }
    }

    /// Share an existing cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this pipeline.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Settings in use.
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decode `video` into `output_dir`.
    ///
    /// Frames are extracted into a temporary directory that is removed on
    /// every exit path. Change snapshots go to `frames_dir`.
    pub fn run(
        &self,
        video: &Path,
        frames_dir: &Path,
        output_dir: &Path,
        observer: Option<ProgressFn<'_>>,
    ) -> Result<DecodeReport> {
        let started = Instant::now();
        self.config.validate()?;
        if !video.is_file() {
            return Err(TransferError::InvalidInput(format!(
                "video not found: {}",
                video.display()
            )));
        }

        prepare_frames_dir(frames_dir)?;
        fs::create_dir_all(output_dir)?;

        let scratch = tempfile::Builder::new().prefix("qr-frames-").tempdir()?;
        info!(
            video = %video.display(),
            fps = self.config.fps,
            threshold = self.config.change_threshold,
            "extracting frames"
        );
        self.extractor.extract(video, scratch.path(), self.config.fps)?;
        let paths: Vec<PathBuf> = list_frames(scratch.path())?;
        notify(observer, ProgressEvent::FramesExtracted { frames: paths.len() });

        let outcome = decode_frame_stream(
            FrameReader::new(paths),
            &self.config,
            Some(frames_dir),
            observer,
            &self.cancel,
        )?;
        if self.cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let payload = reassemble(&outcome.chunks, output_dir)?;
        notify(
            observer,
            ProgressEvent::PayloadWritten {
                bytes: payload.payload_bytes,
            },
        );

        let elapsed = started.elapsed();
        let telemetry = outcome.telemetry;
        info!(
            frames = telemetry.frames,
            segments = telemetry.segments,
            chunks = telemetry.chunks,
            missed = telemetry.missed_segments,
            elapsed_ms = elapsed.as_millis() as u64,
            "decode finished"
        );
        Ok(DecodeReport {
            payload,
            telemetry,
            elapsed,
        })
    }
}
