use std::env;
use std::path::Path;
use std::sync::Once;

use image::{GenericImageView, RgbImage};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static TEST_TRACING: Once = Once::new();

fn max_dim_from_env() -> Option<u32> {
    match env::var("QR_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Install the fmt subscriber used by the CLI.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `verbose`.
/// Calling it twice is harmless.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

/// Route tracing output through the test harness; only the first call counts.
pub fn init_test_tracing() {
    TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,qr_transfer=debug"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_test_writer().compact())
            .try_init();
    });
}

/// Load an image as RGB.
///
/// When `QR_MAX_DIM` is set (and not 0), images whose longer side exceeds it
/// are downscaled first.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage, image::ImageError> {
    let img = image::open(path)?;
    if let Some(max_dim) = max_dim_from_env() {
        let (w, h) = img.dimensions();
        if w.max(h) > max_dim {
            return Ok(img
                .resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
                .to_rgb8());
        }
    }
    Ok(img.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_load_rgb_converts_gray_png() {
        init_test_tracing();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gray.png");
        image::GrayImage::from_pixel(5, 3, image::Luma([100])).save(&path).unwrap();

        let rgb = load_rgb(&path).unwrap();
        assert_eq!(rgb.dimensions(), (5, 3));
        assert_eq!(*rgb.get_pixel(4, 2), Rgb([100, 100, 100]));
    }

    #[test]
    fn test_load_rgb_missing_file() {
        assert!(load_rgb("/nonexistent/frame.png").is_err());
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing(false);
        init_tracing(true);
    }
}
