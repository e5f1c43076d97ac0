use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma, Rgb, RgbImage};
use qr_transfer::utils::binarization::{hybrid_binarize, otsu_binarize, threshold_binarize};
use qr_transfer::utils::grayscale::{invert_luma, rgb_to_luma};

/// Checkerboard of 8px cells with a left-to-right lighting gradient.
fn lit_checkerboard(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let light = 60 + (x * 120 / width.max(1)) as u8;
        if ((x / 8) + (y / 8)) % 2 == 0 {
            Luma([light.saturating_sub(50)])
        } else {
            Luma([light.saturating_add(70)])
        }
    })
}

fn bench_otsu_binarize_medium(c: &mut Criterion) {
    let gray = lit_checkerboard(640, 480);
    c.bench_function("otsu_binarize_640x480", |b| {
        b.iter(|| otsu_binarize(black_box(&gray)))
    });
}

fn bench_otsu_binarize_large(c: &mut Criterion) {
    let gray = lit_checkerboard(1920, 1080);
    c.bench_function("otsu_binarize_1920x1080", |b| {
        b.iter(|| otsu_binarize(black_box(&gray)))
    });
}

fn bench_hybrid_binarize_medium(c: &mut Criterion) {
    let gray = lit_checkerboard(640, 480);
    c.bench_function("hybrid_binarize_640x480", |b| {
        b.iter(|| hybrid_binarize(black_box(&gray)))
    });
}

fn bench_hybrid_binarize_large(c: &mut Criterion) {
    let gray = lit_checkerboard(1920, 1080);
    c.bench_function("hybrid_binarize_1920x1080", |b| {
        b.iter(|| hybrid_binarize(black_box(&gray)))
    });
}

fn bench_threshold_binarize_medium(c: &mut Criterion) {
    let gray = lit_checkerboard(640, 480);
    c.bench_function("threshold_binarize_640x480", |b| {
        b.iter(|| threshold_binarize(black_box(&gray), black_box(128)))
    });
}

fn bench_rgb_to_luma_large(c: &mut Criterion) {
    let rgb = RgbImage::from_pixel(1920, 1080, Rgb([120, 130, 140]));
    c.bench_function("rgb_to_luma_1920x1080", |b| {
        b.iter(|| rgb_to_luma(black_box(&rgb)))
    });
}

fn bench_invert_luma_large(c: &mut Criterion) {
    let gray = lit_checkerboard(1920, 1080);
    c.bench_function("invert_luma_1920x1080", |b| {
        b.iter(|| invert_luma(black_box(&gray)))
    });
}

criterion_group!(
    benches,
    bench_otsu_binarize_medium,
    bench_otsu_binarize_large,
    bench_hybrid_binarize_medium,
    bench_hybrid_binarize_large,
    bench_threshold_binarize_medium,
    bench_rgb_to_luma_large,
    bench_invert_luma_large
);
criterion_main!(benches);
