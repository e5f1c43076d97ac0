//! Playback session over a rendered deck.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::render::deck::{SlideAsset, SlideDeck};

/// Owns at most one active deck.
///
/// Starting a new deck stops and cleans up the previous one first, so two
/// transfers never share the screen or leak temporary files.
#[derive(Debug)]
pub struct SlideshowController {
    active: Option<Session>,
    delay: Duration,
}

#[derive(Debug)]
struct Session {
    deck: SlideDeck,
    position: usize,
}

impl SlideshowController {
    /// Controller advancing every `delay_ms` milliseconds during `play`.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            active: None,
            delay: Duration::from_millis(delay_ms),
        }
    }

    /// Make `deck` the active session, stopping any previous one.
    pub fn start(&mut self, deck: SlideDeck) {
        self.stop();
        info!(slides = deck.len(), "slideshow started");
        self.active = Some(Session { deck, position: 0 });
    }

    /// True while a deck is loaded.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Next slide to show, or `None` once the deck is exhausted.
    ///
    /// Passing the last slide ends the session and removes its files.
    pub fn advance(&mut self) -> Option<SlideAsset> {
        let session = self.active.as_mut()?;
        match session.deck.slides().get(session.position).cloned() {
            Some(slide) => {
                session.position += 1;
                Some(slide)
            }
            None => {
                self.stop();
                None
            }
        }
    }

    /// Show every remaining slide through `show`, waiting between slides.
    ///
    /// `show` returns `false` to stop early. The session is cleaned up on
    /// every exit path.
    pub fn play<F>(&mut self, mut show: F) -> usize
    where
        F: FnMut(&SlideAsset) -> bool,
    {
        let mut shown = 0;
        while let Some(slide) = self.advance() {
            if shown > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            shown += 1;
            if !show(&slide) {
                info!(shown, "slideshow interrupted");
                break;
            }
        }
        self.stop();
        shown
    }

    /// End the active session, deleting its slides.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.active.take() {
            session.deck.cleanup();
            info!("slideshow stopped");
        }
    }
}

impl Drop for SlideshowController {
    fn drop(&mut self) {
        self.stop();
    }
}
