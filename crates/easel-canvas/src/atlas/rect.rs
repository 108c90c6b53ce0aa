use crate::coords::Vec2;

/// Axis-aligned rectangle in atlas pixel space.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Up to three rectangles left over after a guillotine split.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SplitRemainder {
    rects: [AtlasRect; 3],
    len: usize,
}

impl SplitRemainder {
    fn push(&mut self, r: AtlasRect) {
        if !r.is_empty() {
            self.rects[self.len] = r;
            self.len += 1;
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[AtlasRect] {
        &self.rects[..self.len]
    }
}

impl AtlasRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[inline]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    #[inline]
    pub fn can_fit(&self, width: u32, height: u32) -> bool {
        width <= self.width && height <= self.height
    }

    /// Interiors intersect; shared edges do not count.
    #[inline]
    pub fn overlaps(&self, other: &AtlasRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Origin in atlas pixels, used to offset source-frame UVs.
    #[inline]
    pub fn uv_offset(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }

    /// Places `width × height` at this rect's origin and returns the placed
    /// rect plus the remainder: right strip beside the placement, bottom
    /// strip below it, and the corner when both dimensions shrink.
    pub fn split(&self, width: u32, height: u32) -> (AtlasRect, SplitRemainder) {
        debug_assert!(self.can_fit(width, height));

        let placed = AtlasRect::new(self.x, self.y, width, height);
        let mut rest = SplitRemainder::default();
        rest.push(AtlasRect::new(self.x + width, self.y, self.width - width, height));
        rest.push(AtlasRect::new(self.x, self.y + height, width, self.height - height));
        rest.push(AtlasRect::new(
            self.x + width,
            self.y + height,
            self.width - width,
            self.height - height,
        ));
        (placed, rest)
    }
}
