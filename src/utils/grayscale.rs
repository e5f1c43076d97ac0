/// Convert RGB pixels to luminance
/// Y = 0.299*R + 0.587*G + 0.114*B
/// Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
use image::{GrayImage, RgbImage};
use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let lum = (COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8;
    lum.min(255) as u8
}

/// Convert an RGB image to grayscale, one row per rayon task.
pub fn rgb_to_luma(rgb: &RgbImage) -> GrayImage {
    let (width, height) = rgb.dimensions();
    let w = width as usize;
    let src = rgb.as_raw();
    let mut gray = vec![0u8; w * height as usize];

    if w > 0 {
        gray.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            let row_start = y * w * 3;
            for (x, out) in row.iter_mut().enumerate() {
                let idx = row_start + x * 3;
                *out = luma(src[idx], src[idx + 1], src[idx + 2]);
            }
        });
    }

    GrayImage::from_raw(width, height, gray).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Luminance-inverted copy (dark becomes light).
pub fn invert_luma(gray: &GrayImage) -> GrayImage {
    let mut inverted = gray.clone();
    inverted.par_chunks_mut(1024).for_each(|chunk| {
        for v in chunk {
            *v = 255 - *v;
        }
    });
    inverted
}
