//! Built-in 5x7 bitmap face for badge labels.

use image::{GrayImage, Luma};

/// Glyph cell width in font pixels.
pub const GLYPH_WIDTH: u32 = 5;
/// Glyph cell height in font pixels.
pub const GLYPH_HEIGHT: u32 = 7;
const GLYPH_SPACING: u32 = 1;

/// Rows of a glyph, most significant of the low 5 bits is the left column.
fn glyph_rows(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        '/' => [0x01, 0x02, 0x02, 0x04, 0x08, 0x08, 0x10],
        _ => return None,
    };
    Some(rows)
}

/// Size of one font pixel for a nominal font size.
pub fn pixel_size(font_size: u32) -> u32 {
    (font_size / GLYPH_HEIGHT).max(1)
}

/// Width and height in image pixels of `text` at `font_size`.
pub fn measure(text: &str, font_size: u32) -> (u32, u32) {
    let unit = pixel_size(font_size);
    let count = text.chars().count() as u32;
    if count == 0 {
        return (0, 0);
    }
    let width = (count * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING) * unit;
    (width, GLYPH_HEIGHT * unit)
}

/// Draw `text` with its top-left corner at (`x`, `y`).
///
/// Characters without a glyph leave a blank cell.
pub fn draw_text(image: &mut GrayImage, text: &str, x: u32, y: u32, font_size: u32, value: u8) {
    let unit = pixel_size(font_size);
    let (width, height) = image.dimensions();
    let mut pen_x = x;

    for c in text.chars() {
        if let Some(rows) = glyph_rows(c) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let px = pen_x + col * unit;
                    let py = y + row as u32 * unit;
                    for dy in 0..unit {
                        for dx in 0..unit {
                            if px + dx < width && py + dy < height {
                                image.put_pixel(px + dx, py + dy, Luma([value]));
                            }
                        }
                    }
                }
            }
        }
        pen_x += (GLYPH_WIDTH + GLYPH_SPACING) * unit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure() {
        assert_eq!(measure("W", 8), (5, 7));
        assert_eq!(measure("12", 14), (22, 14));
        assert_eq!(measure("", 24), (0, 0));
    }

    #[test]
    fn test_draw_digit_one() {
        let mut image = GrayImage::from_pixel(10, 10, Luma([255]));
        draw_text(&mut image, "1", 1, 1, 7, 0);
        // Vertical stroke in the middle column, serif at the bottom
        assert_eq!(image.get_pixel(3, 1)[0], 0);
        assert_eq!(image.get_pixel(3, 5)[0], 0);
        assert_eq!(image.get_pixel(1, 7)[0], 255);
        assert_eq!(image.get_pixel(2, 7)[0], 0);
        assert_eq!(image.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_every_badge_char_has_a_glyph() {
        for c in "0123456789W/".chars() {
            assert!(glyph_rows(c).is_some(), "missing glyph for {c}");
        }
        assert!(glyph_rows('?').is_none());
    }
}
