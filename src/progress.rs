//! Progress checkpoints and cooperative cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Checkpoint reported to an observer while encoding or decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// `done` of `total` slides rendered; `done` only ever grows.
    SlideRendered {
        /// Slides finished, counted in slide order.
        done: usize,
        /// Slides in the deck, warmup included.
        total: usize,
    },
    /// Frame extraction finished.
    FramesExtracted {
        /// Images on disk.
        frames: usize,
    },
    /// One frame went through the segmenter.
    FrameProcessed {
        /// Frame ordinal.
        index: usize,
        /// Signature distance to the previous frame.
        distance: Option<f64>,
    },
    /// A segment was decoded.
    SegmentDecoded {
        /// Segment ordinal.
        ordinal: usize,
        /// Frames in the segment.
        frames: usize,
        /// Length of the decoded text, `None` on a miss.
        text_len: Option<usize>,
    },
    /// The payload was written.
    PayloadWritten {
        /// Bytes written.
        bytes: usize,
    },
}

/// Observer callback; may be called from rayon worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn(ProgressEvent) + Sync);

/// Report `event` when an observer is attached.
pub fn notify(observer: Option<ProgressFn<'_>>, event: ProgressEvent) {
    if let Some(observer) = observer {
        observer(event);
    }
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// True once `cancel` has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
