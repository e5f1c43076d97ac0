//! Payload framing: text or file bytes into warmup-prefixed chunk strings.

pub mod framer;
pub mod mime;

pub use framer::{PayloadFramer, build_file_payload, tag_payload};
