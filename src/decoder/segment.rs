//! Segment-level decoding.
//!
//! A segment is sampled at a few representative frames. The first sample, in
//! sample order, whose text differs from the previously accepted text wins.
//! When every sample misses, the unsampled frames next to each sample are
//! tried. When still no new text turns up a pixel-wise mean of the whole
//! segment is tried once, and as a last resort a text equal to the previous
//! one is returned so the caller can recognise the repeat.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::DecodeConfig;
use crate::decoder::robust::{DecodeStats, RobustDecoder};
use crate::decoder::symbol::SymbolReader;
use crate::models::Segment;
use crate::utils::geometry::average_images;

/// Source label used for text decoded from the segment mean.
pub const SEGMENT_MEAN_LABEL: &str = "segment-mean";

/// Furthest neighbour tried on each side of a missed sample.
pub const NEIGHBOR_REACH: usize = 4;

/// Text recovered from a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDecode {
    /// Decoded text.
    pub text: String,
    /// Frame label, or `segment-mean`.
    pub source_label: String,
    /// True when the text equals the previously accepted text.
    pub repeated: bool,
}

/// Frame positions to try for a segment of `frame_count` frames.
///
/// Target is `max(3, window)` (window 0 means 4), capped at `frame_count`.
/// The midpoint, first and last frames come first; evenly spaced positions
/// `round((i + 0.5) / target * (n - 1))` fill the rest. Duplicates are
/// skipped and the list stops at the target.
///
/// The anchors go ahead of the spaced points, not after them with the list
/// truncated, so a small window still covers both ends of the segment.
pub fn sample_indexes(frame_count: usize, decode_window: usize) -> Vec<usize> {
    if frame_count == 0 {
        return Vec::new();
    }
    let window = if decode_window == 0 { 4 } else { decode_window };
    let target = window.max(3).min(frame_count);
    let last = frame_count - 1;

    let mut indexes = Vec::with_capacity(target);
    let add = |idx: usize, indexes: &mut Vec<usize>| {
        if indexes.len() < target && !indexes.contains(&idx) {
            indexes.push(idx);
        }
    };

    add(frame_count / 2, &mut indexes);
    add(0, &mut indexes);
    add(last, &mut indexes);
    for i in 0..target {
        let pos = (i as f64 + 0.5) / target as f64;
        let idx = (pos * last as f64).round() as usize;
        add(idx.min(last), &mut indexes);
    }
    indexes
}

/// Unsampled frames around `samples`, nearest first.
///
/// For each sample in order, offsets `-1, +1, -2, +2, ...` up to
/// [`NEIGHBOR_REACH`] are visited; positions outside the segment, already
/// sampled or already listed are skipped.
pub fn neighbor_indexes(frame_count: usize, samples: &[usize]) -> Vec<usize> {
    let mut out = Vec::new();
    for &sample in samples {
        for offset in 1..=NEIGHBOR_REACH {
            let around = [sample.checked_sub(offset), Some(sample + offset)];
            for idx in around.into_iter().flatten() {
                if idx < frame_count && !samples.contains(&idx) && !out.contains(&idx) {
                    out.push(idx);
                }
            }
        }
    }
    out
}

/// Outcome of decoding a list of frames.
#[derive(Default)]
struct Scan {
    new_text: Option<SegmentDecode>,
    same_as_previous: Option<SegmentDecode>,
    any_hit: bool,
}

/// Decodes segments against the previously accepted text.
#[derive(Debug, Clone)]
pub struct SegmentDecoder<R: SymbolReader> {
    robust: RobustDecoder<R>,
    decode_window: usize,
    parallel: bool,
}

impl<R: SymbolReader> SegmentDecoder<R> {
    /// Segment decoder over `robust`, sampling per `config`.
    pub fn new(robust: RobustDecoder<R>, config: &DecodeConfig) -> Self {
        Self {
            robust,
            decode_window: config.decode_window,
            parallel: config.parallel,
        }
    }

    /// Decode one segment.
    ///
    /// Returns `None` when neither the samples, their neighbours nor the mean
    /// image decode.
    pub fn decode(
        &self,
        segment: &Segment,
        previous: Option<&str>,
        stats: &mut DecodeStats,
    ) -> Option<SegmentDecode> {
        let frames = segment.frames();
        if frames.is_empty() {
            return None;
        }
        let indexes = sample_indexes(frames.len(), self.decode_window);
        let is_new = |text: &str| previous != Some(text);

        let sampled = self.scan(segment, &indexes, previous, stats);
        if sampled.new_text.is_some() {
            return sampled.new_text;
        }
        let mut same_as_previous = sampled.same_as_previous;

        if !sampled.any_hit {
            let neighbors = neighbor_indexes(frames.len(), &indexes);
            if !neighbors.is_empty() {
                debug!(segment = segment.ordinal, frames = neighbors.len(), "trying neighbour frames");
                let nearby = self.scan(segment, &neighbors, previous, stats);
                if nearby.new_text.is_some() {
                    return nearby.new_text;
                }
                same_as_previous = same_as_previous.or(nearby.same_as_previous);
            }
        }

        if frames.len() >= 2 {
            let mean = average_images(frames.iter().map(|f| &f.image));
            if let Some(hit) = mean.and_then(|m| self.robust.decode_with_stats(&m, stats)) {
                if is_new(&hit.text) {
                    debug!(segment = segment.ordinal, "decoded from segment mean");
                    return Some(found(hit.text, SEGMENT_MEAN_LABEL, false));
                }
                if same_as_previous.is_none() {
                    same_as_previous = Some(found(hit.text, SEGMENT_MEAN_LABEL, true));
                }
            }
        }

        if same_as_previous.is_none() {
            if segment.transient {
                debug!(segment = %segment.describe(), "no symbol decoded in transient run");
            } else {
                warn!(segment = %segment.describe(), "no symbol decoded in segment");
            }
        }
        same_as_previous
    }

    /// Decode the frames at `indexes`, keeping the first new text in index
    /// order whether or not the work runs in parallel.
    fn scan(
        &self,
        segment: &Segment,
        indexes: &[usize],
        previous: Option<&str>,
        stats: &mut DecodeStats,
    ) -> Scan {
        let frames = segment.frames();
        let is_new = |text: &str| previous != Some(text);
        let mut scan = Scan::default();

        if self.parallel && indexes.len() > 1 {
            // Every frame is attempted; results are read back in index order.
            let results: Vec<(Option<String>, DecodeStats)> = indexes
                .par_iter()
                .map(|&i| {
                    let mut local = DecodeStats::default();
                    let text = self
                        .robust
                        .decode_with_stats(&frames[i].image, &mut local)
                        .map(|hit| hit.text);
                    (text, local)
                })
                .collect();

            for (&i, (text, local)) in indexes.iter().zip(results) {
                stats.merge(&local);
                let Some(text) = text else { continue };
                scan.any_hit = true;
                if scan.new_text.is_some() {
                    continue;
                }
                if is_new(&text) {
                    scan.new_text = Some(found(text, &frames[i].label, false));
                } else if scan.same_as_previous.is_none() {
                    scan.same_as_previous = Some(found(text, &frames[i].label, true));
                }
            }
        } else {
            for &i in indexes {
                let frame = &frames[i];
                let Some(hit) = self.robust.decode_with_stats(&frame.image, stats) else {
                    debug!(segment = segment.ordinal, frame = %frame.label, "frame missed");
                    continue;
                };
                scan.any_hit = true;
                if is_new(&hit.text) {
                    scan.new_text = Some(found(hit.text, &frame.label, false));
                    break;
                }
                if scan.same_as_previous.is_none() {
                    scan.same_as_previous = Some(found(hit.text, &frame.label, true));
                }
            }
        }
        scan
    }
}

fn found(text: String, label: &str, repeated: bool) -> SegmentDecode {
    SegmentDecode {
        text,
        source_label: label.to_string(),
        repeated,
    }
}
