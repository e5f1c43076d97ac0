//! Slide rendering: chunks into labelled QR bitmaps and playback decks.

pub mod deck;
pub mod glyphs;
pub mod slide;
pub mod slideshow;

pub use deck::{SlideAsset, SlideDeck};
pub use slide::{Slide, SlideRenderer, badge_text, title_for};
pub use slideshow::SlideshowController;
