/// Pixel rectangle inside the atlas texture.
///
/// The origin is the top-left corner of the texture; `y` grows downwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl AtlasRect {
    pub const EMPTY: AtlasRect = AtlasRect { x: 0, y: 0, width: 0, height: 0 };

    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &AtlasRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Normalized texture coordinates as `(u_min, v_min, u_max, v_max)`.
    pub fn uv(&self, texture_size: (u32, u32)) -> (f32, f32, f32, f32) {
        let (tw, th) = (texture_size.0 as f32, texture_size.1 as f32);
        (
            self.x as f32 / tw,
            self.y as f32 / th,
            self.right() as f32 / tw,
            self.bottom() as f32 / th,
        )
    }
}

/// A single rasterized glyph and the metrics needed to lay it out.
///
/// Metrics are in pixels at the atlas font size. The bearing follows the
/// usual y-up convention: `ymin` is the offset from the baseline to the
/// bottom edge of the bitmap, so glyphs with descenders have a negative `ymin`.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphEntry {
    /// The character this glyph renders
    pub symbol: char,
    /// Location of the coverage bitmap in the atlas; empty for blank glyphs
    pub rect: AtlasRect,
    /// Offset `(xmin, ymin)` of the bitmap relative to the pen position
    pub bearing: (i32, i32),
    /// Horizontal pen advance after drawing this glyph
    pub advance: f32,
}

impl GlyphEntry {
    /// Returns true if the glyph has no visible pixels, e.g. a space.
    pub fn is_blank(&self) -> bool {
        self.rect.is_empty()
    }
}

/// Horizontal kerning adjustment between two consecutive characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KerningPair {
    pub left: char,
    pub right: char,
    /// Added to the pen position between `left` and `right`; usually negative
    pub adjust: f32,
}

impl KerningPair {
    pub(crate) fn key(&self) -> (char, char) {
        (self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges() {
        let r = AtlasRect::new(3, 4, 10, 20);
        assert_eq!(r.right(), 13);
        assert_eq!(r.bottom(), 24);
        assert!(!r.is_empty());
        assert!(AtlasRect::EMPTY.is_empty());
        assert!(AtlasRect::new(1, 1, 0, 5).is_empty());
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = AtlasRect::new(0, 0, 10, 10);
        let right = AtlasRect::new(10, 0, 10, 10);
        let below = AtlasRect::new(0, 10, 10, 10);
        let overlap = AtlasRect::new(9, 9, 2, 2);

        assert!(!a.intersects(&right));
        assert!(!a.intersects(&below));
        assert!(a.intersects(&overlap));
        assert!(overlap.intersects(&a));
    }

    #[test]
    fn empty_rect_never_intersects() {
        let a = AtlasRect::new(0, 0, 10, 10);
        assert!(!a.intersects(&AtlasRect::new(5, 5, 0, 0)));
    }

    #[test]
    fn uv_coordinates_are_normalized() {
        let r = AtlasRect::new(64, 32, 64, 32);
        let (u0, v0, u1, v1) = r.uv((256, 128));
        assert_eq!((u0, v0, u1, v1), (0.25, 0.25, 0.5, 0.5));
    }
}
