//! Turning decoded chunks back into a file
//!
//! - `payload`: concatenation and tagged-payload parsing
//! - `output`: naming, collision handling, writing
//! - `archive`: ZIP extraction with escape checks

/// ZIP detection and guarded extraction
pub mod archive;
/// Output naming and the reassembly entry point
pub mod output;
/// Chunk concatenation and payload parsing
pub mod payload;

pub use archive::{extract_zip, is_zip_payload};
pub use output::{PayloadReassembler, ReassembledPayload, reassemble, sanitize_file_name, unique_path};
pub use payload::{ParsedPayload, combine_chunks, decode_payload};
