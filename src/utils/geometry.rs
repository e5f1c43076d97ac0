//! Crops, rescaling and pixel statistics on image buffers.

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

use crate::models::Rect;

/// Smallest side a center crop may have before it is considered useless.
pub const MIN_CROP_SIDE: u32 = 32;

/// Centered square crop covering `ratio` of the shorter side.
///
/// Returns `None` when the crop would be smaller than `min_side`.
pub fn crop_center(gray: &GrayImage, ratio: f64, min_side: u32) -> Option<GrayImage> {
    let (width, height) = gray.dimensions();
    let rect = Rect::center_square(width, height, ratio, min_side)?;
    Some(imageops::crop_imm(gray, rect.x, rect.y, rect.width, rect.height).to_image())
}

/// Bicubic (Catmull-Rom) rescale by `factor`.
pub fn scale_bicubic(gray: &GrayImage, factor: f64) -> GrayImage {
    let (width, height) = gray.dimensions();
    let new_width = ((f64::from(width) * factor).round() as u32).max(1);
    let new_height = ((f64::from(height) * factor).round() as u32).max(1);
    imageops::resize(gray, new_width, new_height, FilterType::CatmullRom)
}

/// Pixel-wise integer mean of the images.
///
/// Images whose dimensions differ from the first one are ignored. Returns
/// `None` for an empty input.
pub fn average_images<'a, I>(images: I) -> Option<RgbImage>
where
    I: IntoIterator<Item = &'a RgbImage>,
{
    let mut iter = images.into_iter();
    let first = iter.next()?;
    let (width, height) = first.dimensions();
    let mut sums: Vec<u32> = first.as_raw().iter().map(|&v| u32::from(v)).collect();
    let mut count = 1u32;

    for image in iter {
        if image.dimensions() != (width, height) {
            continue;
        }
        for (sum, &v) in sums.iter_mut().zip(image.as_raw()) {
            *sum += u32::from(v);
        }
        count += 1;
    }

    let mean: Vec<u8> = sums.into_iter().map(|s| (s / count) as u8).collect();
    RgbImage::from_raw(width, height, mean)
}

/// Bounding box of every pixel that is not pure white.
///
/// Returns `None` for an all-white image.
pub fn dark_bounds(gray: &GrayImage) -> Option<Rect> {
    let (width, height) = gray.dimensions();
    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel[0] != u8::MAX {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    found.then(|| Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_crop_center() {
        let gray = GrayImage::from_fn(200, 100, |x, _| Luma([x as u8]));
        let crop = crop_center(&gray, 0.9, MIN_CROP_SIDE).unwrap();
        assert_eq!(crop.dimensions(), (90, 90));
        assert_eq!(crop.get_pixel(0, 0)[0], 55);

        assert!(crop_center(&GrayImage::new(30, 30), 0.9, MIN_CROP_SIDE).is_none());
    }

    #[test]
    fn test_scale_bicubic() {
        let gray = GrayImage::from_pixel(10, 20, Luma([200]));
        let scaled = scale_bicubic(&gray, 1.5);
        assert_eq!(scaled.dimensions(), (15, 30));
        assert_eq!(scaled.get_pixel(7, 7)[0], 200);
    }

    #[test]
    fn test_average_images_skips_mismatched() {
        let a = RgbImage::from_pixel(2, 2, Rgb([0, 100, 200]));
        let b = RgbImage::from_pixel(2, 2, Rgb([100, 200, 255]));
        let odd = RgbImage::from_pixel(3, 3, Rgb([255, 255, 255]));

        let mean = average_images([&a, &odd, &b]).unwrap();
        assert_eq!(mean.get_pixel(1, 1), &Rgb([50, 150, 227]));
        assert!(average_images(std::iter::empty()).is_none());
    }

    #[test]
    fn test_dark_bounds() {
        let mut gray = GrayImage::from_pixel(50, 40, Luma([255]));
        assert!(dark_bounds(&gray).is_none());

        gray.put_pixel(10, 5, Luma([0]));
        gray.put_pixel(30, 20, Luma([254]));
        assert_eq!(dark_bounds(&gray), Some(Rect::new(10, 5, 21, 16)));
    }
}
