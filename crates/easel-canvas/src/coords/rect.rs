use super::Vec2;

/// Axis-aligned rectangle in pixels (top-left origin).
///
/// Used both for destination rectangles on the canvas and for source frames
/// inside an image.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin covering `width × height`.
    #[inline]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub fn right(self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(self) -> f32 {
        self.y + self.height
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Corners in quad winding order: top-left, bottom-left, bottom-right, top-right.
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.x, self.bottom()),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.right(), self.y),
        ]
    }

    /// Maps this rect into normalized coordinates of a `width × height` space,
    /// after shifting it by `offset`.
    ///
    /// Returns `(u0, v0, u1, v1)`.
    #[inline]
    pub fn normalized_in(self, offset: Vec2, width: f32, height: f32) -> [f32; 4] {
        [
            (offset.x + self.x) / width,
            (offset.y + self.y) / height,
            (offset.x + self.right()) / width,
            (offset.y + self.bottom()) / height,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── edges ─────────────────────────────────────────────────────────────

    #[test]
    fn right_and_bottom() {
        let r = Rect::new(10.0, 20.0, 5.0, 7.0);
        assert_eq!(r.right(), 15.0);
        assert_eq!(r.bottom(), 27.0);
    }

    #[test]
    fn is_empty_zero_or_negative_size() {
        assert!(Rect::new(0.0, 0.0, 0.0, 5.0).is_empty());
        assert!(Rect::new(0.0, 0.0, 5.0, -1.0).is_empty());
        assert!(!Rect::from_size(1.0, 1.0).is_empty());
    }

    #[test]
    fn corners_follow_quad_winding() {
        let c = Rect::new(1.0, 2.0, 3.0, 4.0).corners();
        assert_eq!(c[0], Vec2::new(1.0, 2.0));
        assert_eq!(c[1], Vec2::new(1.0, 6.0));
        assert_eq!(c[2], Vec2::new(4.0, 6.0));
        assert_eq!(c[3], Vec2::new(4.0, 2.0));
    }

    // ── normalization ─────────────────────────────────────────────────────

    #[test]
    fn normalized_sub_frame() {
        let uv = Rect::new(16.0, 0.0, 16.0, 16.0).normalized_in(Vec2::zero(), 64.0, 32.0);
        assert_eq!(uv, [0.25, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn normalized_with_offset() {
        let uv = Rect::from_size(8.0, 8.0).normalized_in(Vec2::new(8.0, 0.0), 32.0, 16.0);
        assert_eq!(uv, [0.25, 0.0, 0.5, 0.5]);
    }
}
