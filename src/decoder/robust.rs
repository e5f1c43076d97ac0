//! Single-image decode with geometric and binarization fallbacks.
//!
//! Attempt order: the full frame, then centered square crops at
//! `CROP_RATIOS` of the shorter side. Each candidate is tried at
//! `SCALE_FACTORS` (bicubic upscaling), and each scaled variant through the
//! hybrid, global and inverted-hybrid binarizers. The first symbol that
//! decodes ends the search.

use std::borrow::Cow;
use std::fmt;

use image::{GrayImage, RgbImage};
use tracing::{debug, trace};

use crate::decoder::symbol::{RqrrReader, SymbolReader};
use crate::models::BitMatrix;
use crate::utils::binarization::{hybrid_binarize, otsu_binarize};
use crate::utils::geometry::{MIN_CROP_SIDE, crop_center, scale_bicubic};
use crate::utils::grayscale::{invert_luma, rgb_to_luma};

/// Center-crop ratios tried after the full frame.
pub const CROP_RATIOS: [f64; 5] = [0.95, 0.90, 0.85, 0.80, 0.70];

/// Upscaling factors tried for each candidate.
pub const SCALE_FACTORS: [f64; 3] = [1.0, 1.5, 2.0];

/// Thresholding strategy, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarizer {
    /// Local 8x8 block thresholds.
    Hybrid,
    /// One Otsu threshold for the whole image.
    Global,
    /// Hybrid thresholds on the luminance-inverted image.
    InvertedHybrid,
}

impl Binarizer {
    /// All strategies in attempt order.
    pub const ORDER: [Binarizer; 3] = [Binarizer::Hybrid, Binarizer::Global, Binarizer::InvertedHybrid];

    /// Apply the strategy.
    pub fn apply(self, gray: &GrayImage) -> BitMatrix {
        match self {
            Binarizer::Hybrid => hybrid_binarize(gray),
            Binarizer::Global => otsu_binarize(gray),
            Binarizer::InvertedHybrid => hybrid_binarize(&invert_luma(gray)),
        }
    }
}

impl fmt::Display for Binarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Binarizer::Hybrid => "hybrid",
            Binarizer::Global => "global",
            Binarizer::InvertedHybrid => "inverted-hybrid",
        };
        f.write_str(name)
    }
}

/// Which attempt produced a decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeHit {
    /// Decoded text, untrimmed.
    pub text: String,
    /// Crop ratio of the candidate, `None` for the full frame.
    pub crop_ratio: Option<f64>,
    /// Upscaling factor of the variant.
    pub scale: f64,
    /// Binarizer that worked.
    pub binarizer: Binarizer,
}

/// Attempt counters, accumulated across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Images handed to `decode`.
    pub images: usize,
    /// Geometric candidates built.
    pub candidates: usize,
    /// Symbol reads attempted.
    pub attempts: usize,
    /// Images that decoded.
    pub hits: usize,
}

impl DecodeStats {
    /// Add another set of counters.
    pub fn merge(&mut self, other: &DecodeStats) {
        self.images += other.images;
        self.candidates += other.candidates;
        self.attempts += other.attempts;
        self.hits += other.hits;
    }
}

/// Runs the candidate / variant / binarizer cascade.
#[derive(Debug, Clone, Default)]
pub struct RobustDecoder<R: SymbolReader = RqrrReader> {
    reader: R,
}

impl RobustDecoder<RqrrReader> {
    /// Decoder backed by `rqrr`.
    pub fn new() -> Self {
        Self { reader: RqrrReader }
    }
}

impl<R: SymbolReader> RobustDecoder<R> {
    /// Decoder backed by a custom reader.
    pub fn with_reader(reader: R) -> Self {
        Self { reader }
    }

    /// Decoded text of `image`, or `None` when every attempt misses.
    pub fn decode(&self, image: &RgbImage) -> Option<String> {
        let mut stats = DecodeStats::default();
        self.decode_with_stats(image, &mut stats).map(|hit| hit.text)
    }

    /// Like `decode`, reporting which attempt won and counting attempts.
    pub fn decode_with_stats(&self, image: &RgbImage, stats: &mut DecodeStats) -> Option<DecodeHit> {
        stats.images += 1;
        let gray = rgb_to_luma(image);
        let hit = self.decode_gray(&gray, stats);
        if hit.is_some() {
            stats.hits += 1;
        }
        hit
    }

    fn decode_gray(&self, gray: &GrayImage, stats: &mut DecodeStats) -> Option<DecodeHit> {
        let crops = std::iter::once(None).chain(CROP_RATIOS.iter().copied().map(Some));
        for crop_ratio in crops {
            let candidate: Cow<'_, GrayImage> = match crop_ratio {
                None => Cow::Borrowed(gray),
                Some(ratio) => match crop_center(gray, ratio, MIN_CROP_SIDE) {
                    Some(crop) => Cow::Owned(crop),
                    None => continue,
                },
            };
            stats.candidates += 1;

            for scale in SCALE_FACTORS {
                let variant: Cow<'_, GrayImage> = if scale == 1.0 {
                    Cow::Borrowed(candidate.as_ref())
                } else {
                    Cow::Owned(scale_bicubic(&candidate, scale))
                };

                for binarizer in Binarizer::ORDER {
                    stats.attempts += 1;
                    let bits = binarizer.apply(&variant);
                    if let Some(text) = self.reader.read(&bits) {
                        debug!(?crop_ratio, scale, %binarizer, len = text.len(), "symbol decoded");
                        return Some(DecodeHit {
                            text,
                            crop_ratio,
                            scale,
                            binarizer,
                        });
                    }
                    trace!(?crop_ratio, scale, %binarizer, "attempt missed");
                }
            }
        }
        None
    }
}

/// Decode `image` with the default `rqrr` cascade.
pub fn decode_robust(image: &RgbImage) -> Option<String> {
    RobustDecoder::new().decode(image)
}
