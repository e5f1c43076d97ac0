/// Packed binary image: `true` is a dark module, `false` is light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    bits: Vec<u64>,
}

impl BitMatrix {
    /// All-light matrix of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![0; (width * height).div_ceil(64)],
        }
    }

    /// Build a matrix by asking `dark(x, y)` for every cell.
    pub fn from_fn(width: usize, height: usize, mut dark: impl FnMut(usize, usize) -> bool) -> Self {
        let mut matrix = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if dark(x, y) {
                    matrix.set(x, y, true);
                }
            }
        }
        matrix
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell value; out-of-range reads are light.
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        (self.bits[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Set a cell; out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, dark: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        let mask = 1u64 << (index % 64);
        if dark {
            self.bits[index / 64] |= mask;
        } else {
            self.bits[index / 64] &= !mask;
        }
    }

    /// Number of dark cells.
    pub fn count_dark(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_across_word_boundary() {
        let mut matrix = BitMatrix::new(65, 2);
        matrix.set(63, 0, true);
        matrix.set(64, 0, true);
        matrix.set(0, 1, true);
        assert!(matrix.get(63, 0));
        assert!(matrix.get(64, 0));
        assert!(matrix.get(0, 1));
        assert!(!matrix.get(1, 1));
        assert_eq!(matrix.count_dark(), 3);

        matrix.set(64, 0, false);
        assert!(!matrix.get(64, 0));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true);
        assert!(!matrix.get(10, 10));
        assert_eq!(matrix.count_dark(), 0);
    }

    #[test]
    fn test_from_fn() {
        let matrix = BitMatrix::from_fn(4, 4, |x, y| x == y);
        assert_eq!(matrix.count_dark(), 4);
        assert!(matrix.get(2, 2));
        assert!(!matrix.get(2, 3));
    }
}
