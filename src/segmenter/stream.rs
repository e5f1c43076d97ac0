//! Streaming change segmentation.
//!
//! Frames are pushed one at a time. Each frame's signature is compared with
//! the previous frame's only; a distance at or above the threshold is a
//! radical change, which flushes the frames gathered so far as a segment and
//! starts a new one with the changed frame. Runs shorter than the minimum
//! length are still flushed, marked transient.

use tracing::{debug, info};

use crate::config::DecodeConfig;
use crate::models::{Frame, Segment};
use crate::segmenter::signature::FrameSignature;

/// Counters kept while segmenting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmenterStats {
    /// Frames pushed.
    pub total_frames: usize,
    /// Frames that had a predecessor to compare with.
    pub compared_frames: usize,
    /// Distances at or above the threshold.
    pub radical_changes: usize,
    /// Largest distance observed.
    pub max_distance: f64,
    /// Runs shorter than the minimum segment length.
    pub transient_runs: usize,
}

/// What happened to one pushed frame.
#[derive(Debug, Default)]
pub struct PushOutcome {
    /// Distance to the previous frame, absent for the first frame.
    pub distance: Option<f64>,
    /// 1-based change count when this frame started a new run.
    pub change_number: Option<usize>,
    /// Segment completed by this frame, if any.
    pub segment: Option<Segment>,
}

/// Splits a frame stream into runs of visually stable frames.
#[derive(Debug)]
pub struct ChangeSegmenter {
    threshold: f64,
    analysis_size: usize,
    crop_ratio: f64,
    min_segment_frames: usize,
    previous: Option<FrameSignature>,
    current: Vec<Frame>,
    next_ordinal: usize,
    stats: SegmenterStats,
}

impl ChangeSegmenter {
    /// Segmenter using the thresholds of `config`.
    pub fn new(config: &DecodeConfig) -> Self {
        Self {
            threshold: config.change_threshold,
            analysis_size: config.analysis_size,
            crop_ratio: config.crop_ratio,
            min_segment_frames: config.min_segment_frames.max(1),
            previous: None,
            current: Vec::new(),
            next_ordinal: 0,
            stats: SegmenterStats::default(),
        }
    }

    /// Signature of `frame` with this segmenter's settings.
    ///
    /// Pure, so callers may compute signatures for several frames in
    /// parallel before pushing them in order.
    pub fn signature_for(&self, frame: &Frame) -> FrameSignature {
        FrameSignature::from_image(&frame.image, self.analysis_size, self.crop_ratio)
    }

    /// Push the next frame, computing its signature here.
    pub fn push(&mut self, frame: Frame) -> PushOutcome {
        let signature = self.signature_for(&frame);
        self.push_with_signature(frame, signature)
    }

    /// Push the next frame with a precomputed signature.
    pub fn push_with_signature(&mut self, frame: Frame, signature: FrameSignature) -> PushOutcome {
        self.stats.total_frames += 1;
        let mut outcome = PushOutcome::default();

        if let Some(previous) = &self.previous {
            self.stats.compared_frames += 1;
            let distance = signature.distance(previous);
            self.stats.max_distance = self.stats.max_distance.max(distance);
            outcome.distance = Some(distance);

            if distance >= self.threshold {
                self.stats.radical_changes += 1;
                outcome.change_number = Some(self.stats.radical_changes);
                info!(
                    change = self.stats.radical_changes,
                    distance = %format!("{distance:.4}"),
                    frame = %frame.label,
                    "radical change"
                );
                outcome.segment = self.flush();
            }
        }

        self.previous = Some(signature);
        self.current.push(frame);
        outcome
    }

    /// Flush the trailing run at end of stream.
    pub fn finish(&mut self) -> Option<Segment> {
        let segment = self.flush();
        debug!(stats = ?self.stats, "segmentation finished");
        segment
    }

    /// Counters so far.
    pub fn stats(&self) -> SegmenterStats {
        self.stats
    }

    /// Frames gathered since the last change.
    pub fn current_run(&self) -> &[Frame] {
        &self.current
    }

    fn flush(&mut self) -> Option<Segment> {
        if self.current.is_empty() {
            return None;
        }
        let frames = std::mem::take(&mut self.current);
        let mut segment = Segment::from_frames(self.next_ordinal, frames);
        self.next_ordinal += 1;
        if segment.len() < self.min_segment_frames {
            self.stats.transient_runs += 1;
            segment.transient = true;
            debug!(segment = %segment.describe(), "transient run flushed");
        } else {
            debug!(segment = %segment.describe(), "segment flushed");
        }
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frame(index: usize, value: u8) -> Frame {
        Frame::new(
            index,
            format!("frame_{:08}.png", index + 1),
            RgbImage::from_pixel(64, 48, Rgb([value, value, value])),
        )
    }

    fn run(segmenter: &mut ChangeSegmenter, values: &[u8]) -> Vec<Segment> {
        let mut segments: Vec<Segment> = values
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| segmenter.push(frame(i, v)).segment)
            .collect();
        segments.extend(segmenter.finish());
        segments
    }

    #[test]
    fn test_three_blocks_with_flashes() {
        let mut values = Vec::new();
        for (block, level) in [40u8, 110, 180].into_iter().enumerate() {
            if block > 0 {
                values.push(255);
            }
            values.extend(std::iter::repeat_n(level, 5));
        }

        let mut segmenter = ChangeSegmenter::new(&DecodeConfig::default());
        let (stable, flashes): (Vec<Segment>, Vec<Segment>) = run(&mut segmenter, &values)
            .into_iter()
            .partition(|s| !s.transient);

        assert_eq!(stable.len(), 3);
        assert!(stable.iter().all(|s| s.len() == 5));
        assert_eq!(
            stable.iter().map(|s| s.ordinal).collect::<Vec<_>>(),
            vec![0, 2, 4]
        );
        assert_eq!(stable[1].first_index(), Some(6));
        assert_eq!(
            flashes.iter().map(|s| s.first_index()).collect::<Vec<_>>(),
            vec![Some(5), Some(11)]
        );

        let stats = segmenter.stats();
        assert_eq!(stats.total_frames, 17);
        assert_eq!(stats.compared_frames, 16);
        assert_eq!(stats.radical_changes, 4);
        assert_eq!(stats.transient_runs, 2);
        assert!(stats.max_distance > 0.5);
    }

    #[test]
    fn test_first_frame_never_changes() {
        let mut segmenter = ChangeSegmenter::new(&DecodeConfig::default());
        let outcome = segmenter.push(frame(0, 0));
        assert!(outcome.distance.is_none());
        assert!(outcome.change_number.is_none());
        assert!(outcome.segment.is_none());
    }

    #[test]
    fn test_small_changes_stay_in_segment() {
        let mut segmenter = ChangeSegmenter::new(&DecodeConfig::default());
        let segments = run(&mut segmenter, &[100, 102, 98, 101, 100]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 5);
    }

    #[test]
    fn test_single_frame_runs_are_flushed_as_transient() {
        let mut segmenter = ChangeSegmenter::new(&DecodeConfig::default());
        let segments = run(&mut segmenter, &[0, 0, 255, 0, 0, 128]);
        assert_eq!(
            segments
                .iter()
                .map(|s| (s.len(), s.transient))
                .collect::<Vec<_>>(),
            vec![(2, false), (1, true), (2, false), (1, true)]
        );
    }

    #[test]
    fn test_single_frame_runs_kept_when_suppression_disabled() {
        let config = DecodeConfig {
            min_segment_frames: 1,
            ..DecodeConfig::default()
        };
        let mut segmenter = ChangeSegmenter::new(&config);
        let segments = run(&mut segmenter, &[0, 0, 255, 0, 0]);
        assert_eq!(
            segments.iter().map(Segment::len).collect::<Vec<_>>(),
            vec![2, 1, 2]
        );
        assert!(segments.iter().all(|s| !s.transient));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // Black to white is a distance of exactly 1.0
        let config = DecodeConfig {
            change_threshold: 1.0,
            min_segment_frames: 1,
            ..DecodeConfig::default()
        };
        let mut segmenter = ChangeSegmenter::new(&config);
        segmenter.push(frame(0, 0));
        let outcome = segmenter.push(frame(1, 255));
        assert_eq!(outcome.distance, Some(1.0));
        assert_eq!(outcome.change_number, Some(1));
        assert!(outcome.segment.is_some());
    }
}
