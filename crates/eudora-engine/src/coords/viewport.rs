/// Viewport size in window pixels.
///
/// The text engine derives its pixel-to-NDC scale from the aspect ratio.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// `height / width`; `1.0` for degenerate viewports.
    #[inline]
    pub fn inverse_aspect(self) -> f32 {
        if self.is_valid() { self.height / self.width } else { 1.0 }
    }
}
