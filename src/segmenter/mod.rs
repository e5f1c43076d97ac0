//! Change segmentation of the frame stream.

pub mod signature;
pub mod stream;

pub use signature::{FrameSignature, signature_distance};
pub use stream::{ChangeSegmenter, PushOutcome, SegmenterStats};
