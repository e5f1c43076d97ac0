use rqrr::PreparedImage;

use crate::models::BitMatrix;

/// Reads the text of a QR symbol from a binarized image.
///
/// Implementations only locate and decode; thresholding is done by the
/// caller so several binarizers can be tried on the same pixels.
pub trait SymbolReader: Sync {
    /// Text of the first symbol that decodes, or `None` when nothing does.
    fn read(&self, bits: &BitMatrix) -> Option<String>;
}

/// `rqrr`-backed reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrReader;

impl SymbolReader for RqrrReader {
    fn read(&self, bits: &BitMatrix) -> Option<String> {
        if bits.width() == 0 || bits.height() == 0 {
            return None;
        }
        let mut prepared =
            PreparedImage::prepare_from_bitmap(bits.width(), bits.height(), |x, y| bits.get(x, y));
        prepared
            .detect_grids()
            .iter()
            .find_map(|grid| grid.decode().ok())
            .map(|(_, content)| content)
    }
}
