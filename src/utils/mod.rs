//! Pixel-level helpers
//!
//! - Grayscale conversion (RGB to luminance, inversion)
//! - Binarization (hybrid local thresholds and a global histogram threshold)
//! - Geometry (center crops, bicubic scaling, frame averaging, dark bounds)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
