//! Pre-rendered slide decks living in a scoped temporary directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::RenderConfig;
use crate::error::{Result, TransferError};
use crate::progress::{CancelToken, ProgressEvent, ProgressFn, notify};
use crate::render::slide::SlideRenderer;
use crate::wire::is_warmup;

/// One slide image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideAsset {
    /// PNG file inside the deck directory.
    pub path: PathBuf,
    /// Window caption.
    pub title: String,
}

/// Rendered slides owned by one transfer.
///
/// The temporary directory is deleted by `cleanup`, which runs at most once
/// and is also called on drop.
#[derive(Debug)]
pub struct SlideDeck {
    dir: Option<TempDir>,
    root: PathBuf,
    slides: Vec<SlideAsset>,
}

/// Counts completed slides and releases them to the observer in slide order.
struct OrderedProgress<'a> {
    observer: Option<ProgressFn<'a>>,
    total: usize,
    state: Mutex<(usize, BTreeSet<usize>)>,
}

impl<'a> OrderedProgress<'a> {
    fn new(observer: Option<ProgressFn<'a>>, total: usize) -> Self {
        Self {
            observer,
            total,
            state: Mutex::new((0, BTreeSet::new())),
        }
    }

    fn complete(&self, index: usize) {
        let Ok(mut guard) = self.state.lock() else {
            return;
        };
        let (next, pending) = &mut *guard;
        pending.insert(index);
        while pending.remove(next) {
            *next += 1;
            notify(
                self.observer,
                ProgressEvent::SlideRendered {
                    done: *next,
                    total: self.total,
                },
            );
        }
    }
}

impl SlideDeck {
    /// Render every chunk into a fresh temporary directory.
    ///
    /// Slides render in parallel; `SlideRendered` events still arrive with
    /// increasing `done`. On any failure, including cancellation, the
    /// directory is removed before the error is returned.
    pub fn render(
        chunks: &[String],
        config: &RenderConfig,
        observer: Option<ProgressFn<'_>>,
        cancel: &CancelToken,
    ) -> Result<Self> {
        Self::render_in(&std::env::temp_dir(), chunks, config, observer, cancel)
    }

    /// Like [`SlideDeck::render`], with the `qr-slides-*` directory created
    /// under `parent`.
    pub fn render_in(
        parent: &Path,
        chunks: &[String],
        config: &RenderConfig,
        observer: Option<ProgressFn<'_>>,
        cancel: &CancelToken,
    ) -> Result<Self> {
        config.validate()?;
        if chunks.is_empty() {
            return Err(TransferError::EmptyInput);
        }

        let dir = tempfile::Builder::new()
            .prefix("qr-slides-")
            .tempdir_in(parent)?;
        let root = dir.path().to_path_buf();
        info!(dir = %root.display(), slides = chunks.len(), "rendering slides");

        let has_warmup = chunks.first().is_some_and(|c| is_warmup(c));
        let data_count = chunks.len() - usize::from(has_warmup);
        let renderer = SlideRenderer::new(config.canvas_side, data_count);
        let progress = OrderedProgress::new(observer, chunks.len());

        let rendered: Result<Vec<SlideAsset>> = chunks
            .par_iter()
            .enumerate()
            .map(|(i, chunk)| {
                if cancel.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }
                let index = if has_warmup { i } else { i + 1 };
                let slide = renderer.render(chunk, index, has_warmup && i == 0)?;
                let path = root.join(format!("slide_{i:04}.png"));
                slide.image.save(&path)?;
                progress.complete(i);
                debug!(slide = i, title = %slide.title, "slide rendered");
                Ok(SlideAsset {
                    path,
                    title: slide.title,
                })
            })
            .collect();

        match rendered {
            Ok(slides) => {
                info!(slides = slides.len(), "pre-rendering complete");
                Ok(Self {
                    dir: Some(dir),
                    root,
                    slides,
                })
            }
            Err(err) => {
                if let Err(io) = dir.close() {
                    warn!(error = %io, "failed to remove partial slides");
                }
                Err(err)
            }
        }
    }

    /// Slides in display order.
    pub fn slides(&self) -> &[SlideAsset] {
        &self.slides
    }

    /// Number of slides, warmup included.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// True for a deck without slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Directory holding the slide files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True once the temporary directory has been removed.
    pub fn is_cleaned_up(&self) -> bool {
        self.dir.is_none()
    }

    /// Copy every slide into `dest`, returning the new paths.
    pub fn export(&self, dest: &Path) -> Result<Vec<PathBuf>> {
        if self.is_cleaned_up() {
            return Err(TransferError::InvalidInput(
                "slides were already cleaned up".into(),
            ));
        }
        fs::create_dir_all(dest)?;
        let mut written = Vec::with_capacity(self.slides.len());
        for slide in &self.slides {
            let Some(name) = slide.path.file_name() else {
                continue;
            };
            let target = dest.join(name);
            fs::copy(&slide.path, &target)?;
            written.push(target);
        }
        info!(dest = %dest.display(), slides = written.len(), "slides exported");
        Ok(written)
    }

    /// Delete the temporary directory. Later calls do nothing.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => info!(dir = %self.root.display(), "temporary slides removed"),
                Err(e) => warn!(dir = %self.root.display(), error = %e, "failed to remove slides"),
            }
        }
    }
}

impl Drop for SlideDeck {
    fn drop(&mut self) {
        self.cleanup();
    }
}
