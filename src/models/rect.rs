/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Centered square whose side is `ratio` of the shorter image side.
    ///
    /// Returns `None` when that side would be smaller than `min_side`.
    pub fn center_square(width: u32, height: u32, ratio: f64, min_side: u32) -> Option<Self> {
        let side = (f64::from(width.min(height)) * ratio).round() as u32;
        if side < min_side {
            return None;
        }
        let side_w = side.min(width);
        let side_h = side.min(height);
        Some(Self::new(
            (width - side_w) / 2,
            (height - side_h) / 2,
            side_w,
            side_h,
        ))
    }
}
