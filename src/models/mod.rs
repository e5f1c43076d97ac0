//! Plain data types flowing through the encode and decode paths.

pub mod frame;
pub mod matrix;
pub mod rect;

pub use frame::{DecodedChunk, Frame, Segment};
pub use matrix::BitMatrix;
pub use rect::Rect;
