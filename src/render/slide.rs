//! One chunk string into one labelled QR slide.
//!
//! The symbol is encoded at error-correction level L, scaled by an integer
//! factor and centered on a white square canvas with a 4-module quiet zone.
//! A black frame is drawn around the canvas and an index badge is placed in
//! the top-left margin, clear of every dark pixel of the symbol.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

use crate::error::{Result, TransferError};
use crate::render::glyphs;
use crate::utils::geometry::dark_bounds;

const QUIET_ZONE_MODULES: u32 = 4;
const WHITE: u8 = u8::MAX;
const BLACK: u8 = 0;
const MIN_FONT_SIZE: u32 = 8;

/// A rendered slide.
#[derive(Debug, Clone)]
pub struct Slide {
    /// Black-and-white slide bitmap.
    pub image: GrayImage,
    /// Window caption, `QR Warmup` or `QR i/N`.
    pub title: String,
    /// Text drawn in the badge, `W` or the 1-based data index.
    pub badge: String,
}

impl Slide {
    /// RGB copy, the form frames come in.
    pub fn to_rgb(&self) -> RgbImage {
        DynamicImage::ImageLuma8(self.image.clone()).to_rgb8()
    }
}

/// Badge label for the slide at `index` (warmup slide is index 0).
pub fn badge_text(index: usize, is_warmup: bool) -> String {
    if is_warmup {
        "W".to_string()
    } else {
        index.max(1).to_string()
    }
}

/// Caption for the slide at `index` out of `data_count` data slides.
pub fn title_for(index: usize, is_warmup: bool, data_count: usize) -> String {
    if is_warmup {
        "QR Warmup".to_string()
    } else if data_count > 0 {
        format!("QR {}/{}", index.max(1), data_count)
    } else {
        "QR".to_string()
    }
}

/// Renders chunks onto square canvases of a fixed side.
#[derive(Debug, Clone, Copy)]
pub struct SlideRenderer {
    canvas_side: u32,
    data_count: usize,
}

impl SlideRenderer {
    /// Renderer for a deck holding `data_count` data slides after the warmup.
    pub fn new(canvas_side: u32, data_count: usize) -> Self {
        Self {
            canvas_side,
            data_count,
        }
    }

    /// Render `chunk` as slide `index`.
    pub fn render(&self, chunk: &str, index: usize, is_warmup: bool) -> Result<Slide> {
        let mut image = encode_symbol(chunk, index, self.canvas_side)?;
        let badge = badge_text(index, is_warmup);
        draw_overlay(&mut image, &badge);
        Ok(Slide {
            image,
            title: title_for(index, is_warmup, self.data_count),
            badge,
        })
    }
}

/// Encode `text` and center it on a `side` x `side` white canvas.
fn encode_symbol(text: &str, index: usize, side: u32) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L).map_err(|e| {
        TransferError::Encoding {
            index,
            reason: e.to_string(),
        }
    })?;

    let modules = code.width() as u32;
    let scale = side / (modules + 2 * QUIET_ZONE_MODULES);
    if scale == 0 {
        return Err(TransferError::Encoding {
            index,
            reason: format!("{modules} modules do not fit a {side}px canvas"),
        });
    }

    let offset = (side - modules * scale) / 2;
    let colors = code.to_colors();
    let mut image = GrayImage::from_pixel(side, side, Luma([WHITE]));
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = (i as u32) % modules;
        let my = (i as u32) / modules;
        let x0 = offset + mx * scale;
        let y0 = offset + my * scale;
        for y in y0..y0 + scale {
            for x in x0..x0 + scale {
                image.put_pixel(x, y, Luma([BLACK]));
            }
        }
    }

    debug!(index, version_modules = modules, scale, "encoded symbol");
    Ok(image)
}

/// Border frame plus a rounded badge in the top-left margin.
fn draw_overlay(image: &mut GrayImage, text: &str) {
    let (width, height) = image.dimensions();
    let min_dim = width.min(height);
    let border = (min_dim / 90).max(4);
    let outer_margin = border + (min_dim / 320).max(2);
    let safe_gap = (min_dim / 320).max(2);

    // Margin left free by the symbol, measured before the frame is drawn.
    let (dark_x, dark_y) = dark_bounds(image)
        .map(|r| (r.x, r.y))
        .unwrap_or((width / 2, height / 2));
    let available_width = dark_x.saturating_sub(safe_gap + outer_margin).max(1);
    let available_height = dark_y.saturating_sub(safe_gap + outer_margin).max(1);

    let layout = fit_badge(text, min_dim, available_width, available_height);

    fill_rect(image, 0, 0, width, border, BLACK);
    fill_rect(image, 0, height.saturating_sub(border), width, border, BLACK);
    fill_rect(image, 0, 0, border, height, BLACK);
    fill_rect(image, width.saturating_sub(border), 0, border, height, BLACK);

    let (x, y) = (outer_margin, outer_margin);
    let corner = (layout.box_width.min(layout.box_height) / 5).max(8);
    draw_rounded_badge(image, x, y, layout.box_width, layout.box_height, corner / 2);

    let text_x = x + (layout.box_width - layout.text_width) / 2;
    let text_y = y + (layout.box_height - layout.text_height) / 2;
    glyphs::draw_text(image, text, text_x, text_y, layout.font_size, BLACK);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BadgeLayout {
    font_size: u32,
    text_width: u32,
    text_height: u32,
    box_width: u32,
    box_height: u32,
}

/// Largest font size under the cap whose padded box fits the margin.
///
/// Shrinks one point at a time and stops at the floor size even if the box
/// still does not fit.
fn fit_badge(text: &str, min_dim: u32, available_width: u32, available_height: u32) -> BadgeLayout {
    let mut font_size = (min_dim / 42).clamp(10, 24);
    let base_pad_x = (min_dim / 260).max(3);
    let base_pad_y = (min_dim / 300).max(3);

    loop {
        let (text_width, text_height) = glyphs::measure(text, font_size);
        let max_pad_x = (available_width.saturating_sub(text_width) / 2).max(2);
        let max_pad_y = (available_height.saturating_sub(text_height) / 2).max(2);
        let pad_x = base_pad_x.min(max_pad_x).max(2);
        let pad_y = base_pad_y.min(max_pad_y).max(2);
        let layout = BadgeLayout {
            font_size,
            text_width,
            text_height,
            box_width: text_width + 2 * pad_x,
            box_height: text_height + 2 * pad_y,
        };
        let fits = layout.box_width <= available_width && layout.box_height <= available_height;
        if fits || font_size <= MIN_FONT_SIZE {
            return layout;
        }
        font_size -= 1;
    }
}

fn fill_rect(image: &mut GrayImage, x: u32, y: u32, w: u32, h: u32, value: u8) {
    let (width, height) = image.dimensions();
    for py in y..(y + h).min(height) {
        for px in x..(x + w).min(width) {
            image.put_pixel(px, py, Luma([value]));
        }
    }
}

/// White rounded rectangle with a 1px black outline.
fn draw_rounded_badge(image: &mut GrayImage, x: u32, y: u32, w: u32, h: u32, radius: u32) {
    let (width, height) = image.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let radius = radius.min((w - 1) / 2).min((h - 1) / 2);
    let inside = |px: i64, py: i64| -> bool {
        if px < 0 || py < 0 || px >= i64::from(w) || py >= i64::from(h) {
            return false;
        }
        let r = i64::from(radius);
        let cx = px.clamp(r, i64::from(w) - 1 - r);
        let cy = py.clamp(r, i64::from(h) - 1 - r);
        let (dx, dy) = (px - cx, py - cy);
        dx * dx + dy * dy <= r * r
    };

    for py in 0..h {
        for px in 0..w {
            let (ix, iy) = (i64::from(px), i64::from(py));
            if !inside(ix, iy) || x + px >= width || y + py >= height {
                continue;
            }
            let edge = !inside(ix - 1, iy)
                || !inside(ix + 1, iy)
                || !inside(ix, iy - 1)
                || !inside(ix, iy + 1);
            let value = if edge { BLACK } else { WHITE };
            image.put_pixel(x + px, y + py, Luma([value]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_and_title() {
        assert_eq!(badge_text(0, true), "W");
        assert_eq!(badge_text(3, false), "3");
        assert_eq!(title_for(0, true, 5), "QR Warmup");
        assert_eq!(title_for(2, false, 5), "QR 2/5");
        assert_eq!(title_for(1, false, 0), "QR");
    }

    #[test]
    fn test_render_square_canvas_with_border() {
        let renderer = SlideRenderer::new(360, 1);
        let slide = renderer.render("Hello QR", 1, false).unwrap();
        assert_eq!(slide.image.dimensions(), (360, 360));
        assert_eq!(slide.badge, "1");
        assert_eq!(slide.title, "QR 1/1");
        // Frame corners are black
        assert_eq!(slide.image.get_pixel(0, 0)[0], BLACK);
        assert_eq!(slide.image.get_pixel(359, 359)[0], BLACK);
    }

    #[test]
    fn test_badge_stays_clear_of_symbol() {
        let mut image = encode_symbol("__WARMUP__", 0, 600).unwrap();
        let symbol = dark_bounds(&image).unwrap();
        draw_overlay(&mut image, "W");

        let min_dim = 600;
        let border = (min_dim / 90).max(4);
        let margin = border + (min_dim / 320).max(2);
        let gap = (min_dim / 320).max(2);
        // Nothing drawn between the badge and the symbol inside the gap
        for y in margin..symbol.y {
            for x in (symbol.x - gap)..symbol.x {
                assert_eq!(image.get_pixel(x, y)[0], WHITE, "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn test_fit_badge_shrinks_to_floor() {
        let roomy = fit_badge("12", 1080, 200, 200);
        assert_eq!(roomy.font_size, 24);

        let tight = fit_badge("123", 1080, 30, 16);
        assert!(tight.font_size < 24);
        assert!(tight.font_size >= MIN_FONT_SIZE);
        assert!(tight.box_width <= 30 || tight.font_size == MIN_FONT_SIZE);
    }

    #[test]
    fn test_oversized_chunk_is_encoding_error() {
        let renderer = SlideRenderer::new(1080, 1);
        let chunk = "x".repeat(5000);
        let err = renderer.render(&chunk, 1, false).unwrap_err();
        assert!(matches!(err, TransferError::Encoding { index: 1, .. }));
    }

    #[test]
    fn test_canvas_too_small_is_encoding_error() {
        let renderer = SlideRenderer::new(20, 1);
        assert!(matches!(
            renderer.render("Hello QR", 1, false),
            Err(TransferError::Encoding { .. })
        ));
    }
}
