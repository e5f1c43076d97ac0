//! Binarizers used by the robust decoder.
//!
//! `hybrid_binarize` computes local thresholds from 8x8 blocks and copes with
//! uneven lighting on camera captures. `otsu_binarize` picks one global
//! threshold from the luminance histogram and is the fallback for small or
//! evenly lit images.

use image::GrayImage;

use crate::models::BitMatrix;

const BLOCK_SIZE: usize = 8;
const BLOCK_AREA_SHIFT: u32 = 6;
const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;
const MIN_DYNAMIC_RANGE: u32 = 24;

/// Convert grayscale to binary with a single Otsu threshold.
/// Returns a BitMatrix where true = dark, false = light.
pub fn otsu_binarize(gray: &GrayImage) -> BitMatrix {
    let threshold = calculate_otsu_threshold(gray.as_raw());
    threshold_binarize(gray, threshold)
}

/// Otsu's optimal threshold over a 256-bin histogram.
///
/// Pixels strictly below the returned value belong to the dark class.
pub fn calculate_otsu_threshold(pixels: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &p in pixels {
        histogram[p as usize] += 1;
    }

    let total = pixels.len() as f64;
    if total == 0.0 {
        return 128;
    }
    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum();

    let mut dark_count = 0f64;
    let mut dark_sum = 0f64;
    let mut best_variance = 0f64;
    let mut best_threshold = 128u8;

    // Threshold t puts values 0..t in the dark class.
    for t in 1..=255usize {
        dark_count += histogram[t - 1] as f64;
        dark_sum += (t - 1) as f64 * histogram[t - 1] as f64;
        let light_count = total - dark_count;
        if dark_count == 0.0 || light_count == 0.0 {
            continue;
        }
        let dark_mean = dark_sum / dark_count;
        let light_mean = (total_sum - dark_sum) / light_count;
        let variance = (dark_count / total) * (light_count / total) * (dark_mean - light_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Simple global threshold binarization: dark when `v < threshold`.
pub fn threshold_binarize(gray: &GrayImage, threshold: u8) -> BitMatrix {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let pixels = gray.as_raw();
    BitMatrix::from_fn(width, height, |x, y| pixels[y * width + x] < threshold)
}

/// Local-threshold binarization in 8x8 blocks.
///
/// Each block gets a black point from its mean (or, for flat blocks, from its
/// minimum and already computed neighbours); pixels are then compared against
/// the average black point of the surrounding 5x5 blocks. Images too small for
/// a 5x5 block neighbourhood use `otsu_binarize`.
pub fn hybrid_binarize(gray: &GrayImage) -> BitMatrix {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    if width < MINIMUM_DIMENSION || height < MINIMUM_DIMENSION {
        return otsu_binarize(gray);
    }

    let pixels = gray.as_raw();
    let sub_width = width.div_ceil(BLOCK_SIZE);
    let sub_height = height.div_ceil(BLOCK_SIZE);
    let black_points = block_black_points(pixels, width, height, sub_width, sub_height);

    let max_x_offset = width - BLOCK_SIZE;
    let max_y_offset = height - BLOCK_SIZE;
    let mut binary = BitMatrix::new(width, height);

    for by in 0..sub_height {
        let y0 = (by * BLOCK_SIZE).min(max_y_offset);
        let top = by.clamp(2, sub_height - 3);
        for bx in 0..sub_width {
            let x0 = (bx * BLOCK_SIZE).min(max_x_offset);
            let left = bx.clamp(2, sub_width - 3);

            let mut sum = 0u32;
            for ny in (top - 2)..=(top + 2) {
                let row = &black_points[ny * sub_width..(ny + 1) * sub_width];
                sum += row[left - 2..=left + 2].iter().sum::<u32>();
            }
            let threshold = sum / 25;

            for yy in y0..y0 + BLOCK_SIZE {
                let row = yy * width;
                for xx in x0..x0 + BLOCK_SIZE {
                    if u32::from(pixels[row + xx]) <= threshold {
                        binary.set(xx, yy, true);
                    }
                }
            }
        }
    }

    binary
}

fn block_black_points(
    pixels: &[u8],
    width: usize,
    height: usize,
    sub_width: usize,
    sub_height: usize,
) -> Vec<u32> {
    let max_x_offset = width - BLOCK_SIZE;
    let max_y_offset = height - BLOCK_SIZE;
    let mut black_points = vec![0u32; sub_width * sub_height];

    for by in 0..sub_height {
        let y0 = (by * BLOCK_SIZE).min(max_y_offset);
        for bx in 0..sub_width {
            let x0 = (bx * BLOCK_SIZE).min(max_x_offset);
            let mut sum = 0u32;
            let mut min = u32::MAX;
            let mut max = 0u32;
            for yy in y0..y0 + BLOCK_SIZE {
                let row = yy * width;
                for &p in &pixels[row + x0..row + x0 + BLOCK_SIZE] {
                    let v = u32::from(p);
                    sum += v;
                    min = min.min(v);
                    max = max.max(v);
                }
            }

            let mut average = sum >> BLOCK_AREA_SHIFT;
            if max - min <= MIN_DYNAMIC_RANGE {
                // Flat block: assume light unless the neighbours say otherwise.
                average = min / 2;
                if by > 0 && bx > 0 {
                    let neighbor = (black_points[(by - 1) * sub_width + bx]
                        + 2 * black_points[by * sub_width + bx - 1]
                        + black_points[(by - 1) * sub_width + bx - 1])
                        / 4;
                    if min < neighbor {
                        average = neighbor;
                    }
                }
            }
            black_points[by * sub_width + bx] = average;
        }
    }

    black_points
}
