//! QR decoding for captured frames
//!
//! - `symbol`: symbol location and decoding on a binarized bitmap
//! - `robust`: crop / upscale / binarizer cascade for one image
//! - `segment`: sampling and averaging across a segment of frames

/// Symbol reader capability and the `rqrr` implementation
pub mod symbol;
/// Single-image decode with fallbacks
pub mod robust;
/// Segment-level decode with sampling and mean-image fallback
pub mod segment;

pub use robust::{Binarizer, DecodeHit, DecodeStats, RobustDecoder, decode_robust};
pub use segment::{SEGMENT_MEAN_LABEL, SegmentDecode, SegmentDecoder, sample_indexes};
pub use symbol::{RqrrReader, SymbolReader};
