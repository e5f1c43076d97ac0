//! qr_transfer - move files across a camera-only channel as QR slides
//!
//! The sender splits a payload into text chunks and renders each as a QR
//! slide behind a warmup slide. The receiver records the screen, splits the
//! recording into still frames, groups them into runs showing the same slide,
//! decodes one text per run and rebuilds the original file.
//!
//! ```no_run
//! use qr_transfer::{DecodeConfig, DecodePipeline};
//! use std::path::Path;
//!
//! let pipeline = DecodePipeline::new(DecodeConfig::default());
//! let report = pipeline.run(Path::new("capture.mp4"), Path::new("frames"), Path::new("out"), None)?;
//! println!("wrote {}", report.payload.output_path.display());
//! # Ok::<(), qr_transfer::TransferError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Decode and render settings
pub mod config;
/// QR decoding for captured frames (robust single image, segment sampling)
pub mod decoder;
/// Error type shared by every stage
pub mod error;
/// Payload chunking and MIME tables
pub mod framing;
/// Core data structures (BitMatrix, Frame, Segment, Rect)
pub mod models;
/// Video-to-payload orchestration
pub mod pipeline;
/// Progress events and cancellation
pub mod progress;
/// Chunk reassembly, file output and archive extraction
pub mod reassembly;
/// Slide rendering, slide decks and playback
pub mod render;
/// Change detection over the frame stream
pub mod segmenter;
/// Frame extraction and loading
pub mod source;
/// CLI helpers (logging setup, image loading)
pub mod tools;
/// Utility functions (grayscale, binarization, geometry)
pub mod utils;
/// Wire constants and chunk splitting
pub mod wire;

pub use config::{DecodeConfig, RenderConfig};
pub use decoder::{RobustDecoder, SegmentDecoder, decode_robust};
pub use error::{Result, TransferError};
pub use framing::PayloadFramer;
pub use models::{BitMatrix, DecodedChunk, Frame, Segment};
pub use pipeline::{DecodePipeline, DecodeReport, DecodeTelemetry, decode_frame_stream};
pub use progress::{CancelToken, ProgressEvent, ProgressFn};
pub use reassembly::{PayloadReassembler, ReassembledPayload, combine_chunks, reassemble};
pub use render::{SlideDeck, SlideRenderer, SlideshowController};
pub use segmenter::ChangeSegmenter;
pub use source::{FfmpegExtractor, FrameExtractor, FrameReader};
pub use wire::{CHUNK_SIZE, WARMUP_SENTINEL};
