use image::RgbImage;

/// One still image sampled from the video.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Ordinal position in the sampled sequence (0-based).
    pub index: usize,
    /// Human-readable origin, usually the frame's file name.
    pub label: String,
    /// Pixels.
    pub image: RgbImage,
}

impl Frame {
    /// Create a frame.
    pub fn new(index: usize, label: impl Into<String>, image: RgbImage) -> Self {
        Self {
            index,
            label: label.into(),
            image,
        }
    }
}

/// Run of consecutive frames judged to show the same slide.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    /// Sequence number among emitted segments (0-based).
    pub ordinal: usize,
    /// Shorter than the minimum stable length, e.g. a flash between slides.
    pub transient: bool,
    frames: Vec<Frame>,
}

impl Segment {
    /// Empty segment.
    pub fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            transient: false,
            frames: Vec::new(),
        }
    }

    /// Segment from already collected frames.
    pub fn from_frames(ordinal: usize, frames: Vec<Frame>) -> Self {
        Self {
            ordinal,
            transient: false,
            frames,
        }
    }

    /// Append a frame.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Frames in capture order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no frame was collected.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Ordinal of the first frame, if any.
    pub fn first_index(&self) -> Option<usize> {
        self.frames.first().map(|f| f.index)
    }

    /// Ordinal of the last frame, if any.
    pub fn last_index(&self) -> Option<usize> {
        self.frames.last().map(|f| f.index)
    }

    /// Short description for logs, e.g. `segment 3 [frames 12..=17]`.
    pub fn describe(&self) -> String {
        match (self.first_index(), self.last_index()) {
            (Some(first), Some(last)) => {
                format!("segment {} [frames {}..={}]", self.ordinal, first, last)
            }
            _ => format!("segment {} [empty]", self.ordinal),
        }
    }
}

/// Text recovered from a frame or segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedChunk {
    /// Decoded symbol text as read.
    pub text: String,
    /// Frame label (or `segment-mean`) the text was read from.
    pub source_label: String,
    /// Segment the text belongs to.
    pub segment: usize,
}

impl DecodedChunk {
    /// Create a decoded chunk.
    pub fn new(text: impl Into<String>, source_label: impl Into<String>, segment: usize) -> Self {
        Self {
            text: text.into(),
            source_label: source_label.into(),
            segment,
        }
    }
}

impl AsRef<str> for DecodedChunk {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_bounds() {
        let mut segment = Segment::new(2);
        assert!(segment.is_empty());
        assert_eq!(segment.describe(), "segment 2 [empty]");

        segment.push(Frame::new(7, "frame_00000008.png", RgbImage::new(2, 2)));
        segment.push(Frame::new(8, "frame_00000009.png", RgbImage::new(2, 2)));
        assert_eq!(segment.len(), 2);
        assert_eq!(segment.first_index(), Some(7));
        assert_eq!(segment.last_index(), Some(8));
        assert_eq!(segment.describe(), "segment 2 [frames 7..=8]");
    }
}
