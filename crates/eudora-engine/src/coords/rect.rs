use super::Vec2;

/// Axis-aligned rectangle stored as origin + size.
///
/// Atlas crops use it in normalized texture space (`[0, 1]`, origin top-left).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Whether `other` lies entirely inside `self` (edges inclusive).
    #[inline]
    pub fn contains_rect(self, other: Rect) -> bool {
        let (a0, a1) = (self.origin, self.max());
        let (b0, b1) = (other.origin, other.max());
        b0.x >= a0.x && b0.y >= a0.y && b1.x <= a1.x && b1.y <= a1.y
    }

    /// `[x, y, w, h]`, the layout the text shader reads crops in.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.origin.x, self.origin.y, self.size.x, self.size.y]
    }
}
