//! Error types shared by the encode and decode paths.

use std::path::PathBuf;

use thiserror::Error;

/// Every fatal condition the transfer protocol can surface.
///
/// Per-frame and per-segment decode misses are not errors; they are logged and
/// skipped, and only show up as a lower chunk yield.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Missing or invalid arguments, configuration or source files.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A required source file or video does not exist.
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// The external frame extractor failed or produced nothing.
    #[error("{tool} failed: {output}")]
    ExternalTool {
        /// Name of the tool that was invoked.
        tool: String,
        /// Captured output or a description of the failure.
        output: String,
    },

    /// The symbol encoder rejected a chunk for the requested canvas.
    #[error("cannot encode chunk {index} as a QR symbol: {reason}")]
    Encoding {
        /// Slide index (0 is the warmup slide).
        index: usize,
        /// Reason reported by the encoder.
        reason: String,
    },

    /// The reassembled text is not a valid payload.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An archive entry would be written outside the extraction directory.
    #[error("unsafe archive entry: {entry}")]
    UnsafeArchiveEntry {
        /// Entry name as stored in the archive.
        entry: String,
    },

    /// Nothing to encode.
    #[error("nothing to encode: input is empty")]
    EmptyInput,

    /// No data chunks survived decoding.
    #[error("no payload chunks were decoded")]
    EmptyPayload,

    /// The caller cancelled the run.
    #[error("operation cancelled")]
    Cancelled,

    /// Archive could not be read.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Image could not be read or written.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, TransferError>;

impl TransferError {
    /// True for errors caused by what the user asked for rather than by the data.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidInput(_) | TransferError::MissingFile(_) | TransferError::EmptyInput
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_human_readable() {
        let err = TransferError::UnsafeArchiveEntry {
            entry: "../../evil.sh".to_string(),
        };
        assert_eq!(err.to_string(), "unsafe archive entry: ../../evil.sh");

        let err = TransferError::ExternalTool {
            tool: "ffmpeg".to_string(),
            output: "exit status 1".to_string(),
        };
        assert!(err.to_string().starts_with("ffmpeg failed"));
    }

    #[test]
    fn test_input_error_classification() {
        assert!(TransferError::EmptyInput.is_input_error());
        assert!(TransferError::MissingFile(PathBuf::from("video.mp4")).is_input_error());
        assert!(!TransferError::EmptyPayload.is_input_error());
    }
}
