use image::RgbImage;

use crate::models::Rect;
use crate::utils::geometry::MIN_CROP_SIDE;

/// Downsampled brightness fingerprint of a frame's central region.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSignature {
    size: usize,
    values: Vec<f64>,
}

/// Nearest grid sample along one axis: `round(n * (max - 1) / (size - 1))`.
fn sample_coord(n: usize, size: usize, max: u32) -> u32 {
    if max <= 1 || size <= 1 {
        return 0;
    }
    ((n as f64 * (f64::from(max) - 1.0)) / (size as f64 - 1.0)).round() as u32
}

impl FrameSignature {
    /// Signature of `image` on a `size` x `size` grid.
    ///
    /// The grid covers a centered square of `crop_ratio` of the shorter side,
    /// or the whole frame when that square would be too small.
    pub fn from_image(image: &RgbImage, size: usize, crop_ratio: f64) -> Self {
        let (width, height) = image.dimensions();
        let region = Rect::center_square(width, height, crop_ratio, MIN_CROP_SIDE)
            .unwrap_or(Rect::new(0, 0, width, height));

        let mut values = Vec::with_capacity(size * size);
        if region.is_empty() {
            values.resize(size * size, 0.0);
            return Self { size, values };
        }

        for gy in 0..size {
            let sy = region.y + sample_coord(gy, size, region.height);
            for gx in 0..size {
                let sx = region.x + sample_coord(gx, size, region.width);
                let [r, g, b] = image.get_pixel(sx, sy).0;
                let gray = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
                values.push(f64::from(gray) / 255.0);
            }
        }
        Self { size, values }
    }

    /// Grid side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Grid values in row-major order, each in `[0, 1]`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mean absolute difference; 1.0 when the grids differ in size.
    pub fn distance(&self, other: &FrameSignature) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 1.0;
        }
        let sum: f64 = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| (a - b).abs())
            .sum();
        sum / self.values.len() as f64
    }
}

/// Distance between optional signatures; a missing side is maximally distant.
pub fn signature_distance(a: Option<&FrameSignature>, b: Option<&FrameSignature>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => a.distance(b),
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn solid(value: u8) -> RgbImage {
        RgbImage::from_pixel(80, 60, Rgb([value, value, value]))
    }

    #[test]
    fn test_sample_coord() {
        assert_eq!(sample_coord(0, 64, 100), 0);
        assert_eq!(sample_coord(63, 64, 100), 99);
        assert_eq!(sample_coord(5, 1, 100), 0);
        assert_eq!(sample_coord(5, 64, 1), 0);
    }

    #[test]
    fn test_distance_properties() {
        let a = FrameSignature::from_image(&solid(0), 16, 0.85);
        let b = FrameSignature::from_image(&solid(255), 16, 0.85);
        let c = FrameSignature::from_image(&solid(128), 16, 0.85);

        assert_eq!(a.distance(&a), 0.0);
        assert_eq!(a.distance(&b), 1.0);
        assert_eq!(a.distance(&c), c.distance(&a));
        for d in [a.distance(&c), b.distance(&c)] {
            assert!((0.0..=1.0).contains(&d));
        }
    }

    #[test]
    fn test_size_mismatch_is_maximal() {
        let a = FrameSignature::from_image(&solid(10), 8, 0.85);
        let b = FrameSignature::from_image(&solid(10), 16, 0.85);
        assert_eq!(a.distance(&b), 1.0);
        assert_eq!(signature_distance(Some(&a), None), 1.0);
        assert_eq!(signature_distance(Some(&a), Some(&a)), 0.0);
    }

    #[test]
    fn test_border_noise_is_cropped() {
        // Same center, different edge bands
        let mut noisy = solid(200);
        for y in 0..60 {
            for x in 0..4 {
                noisy.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let clean = FrameSignature::from_image(&solid(200), 16, 0.85);
        let edged = FrameSignature::from_image(&noisy, 16, 0.85);
        assert_eq!(clean.distance(&edged), 0.0);
    }

    #[test]
    fn test_small_frame_uses_full_image() {
        let image = RgbImage::from_fn(20, 20, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let sig = FrameSignature::from_image(&image, 8, 0.85);
        // Left column is sampled because no crop happened
        assert_eq!(sig.values()[0], 0.0);
    }
}
