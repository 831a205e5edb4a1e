//! Skyline rectangle packing.
//!
//! The packer tracks the top edge ("skyline") of everything placed so far as
//! a list of horizontal segments. A new rectangle goes where its top edge
//! ends up lowest, ties broken by the narrowest segment it starts on, which
//! keeps the skyline flat and leaves few unusable gaps for glyph-sized
//! rectangles.

use glint_data::AtlasRect;
use tracing::debug;

/// Edge length the atlas starts growing from.
pub const MIN_ATLAS_SIZE: u32 = 64;

/// Default upper bound for either atlas dimension.
pub const DEFAULT_MAX_ATLAS_SIZE: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("rectangle {index} ({width}x{height}) does not fit")]
    DoesNotFit { index: usize, width: u32, height: u32 },
    #[error("glyphs do not fit into a {max_size}x{max_size} atlas")]
    AtlasTooSmall { max_size: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    x: u32,
    y: u32,
    width: u32,
}

impl Segment {
    const fn right(&self) -> u32 {
        self.x + self.width
    }
}

/// Bottom-left skyline packer over a fixed-size area.
///
/// Every placed rectangle keeps `padding` free pixels towards its neighbors
/// and the area edges.
#[derive(Debug, Clone)]
pub struct SkylinePacker {
    width: u32,
    height: u32,
    padding: u32,
    skyline: Vec<Segment>,
}

impl SkylinePacker {
    pub fn new(width: u32, height: u32, padding: u32) -> Self {
        let skyline = if width > padding && height > padding {
            vec![Segment { x: padding, y: padding, width: width - padding }]
        } else {
            Vec::new()
        };

        Self { width, height, padding, skyline }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Places a `width` x `height` rectangle, or returns `None` when no
    /// position is free.
    ///
    /// Zero-sized rectangles occupy no space and are returned as
    /// [`AtlasRect::EMPTY`].
    pub fn pack(&mut self, width: u32, height: u32) -> Option<AtlasRect> {
        if width == 0 || height == 0 {
            return Some(AtlasRect::EMPTY);
        }

        let padded_w = width.checked_add(self.padding)?;
        let padded_h = height.checked_add(self.padding)?;

        // (index, y, top, segment width)
        let mut best: Option<(usize, u32, u32, u32)> = None;
        for (index, segment) in self.skyline.iter().enumerate() {
            let Some(y) = self.fit(index, padded_w, padded_h) else {
                continue;
            };

            let top = y + padded_h;
            let better = match best {
                None => true,
                Some((_, _, best_top, best_width)) => {
                    top < best_top || (top == best_top && segment.width < best_width)
                },
            };
            if better {
                best = Some((index, y, top, segment.width));
            }
        }

        let (index, y, _, _) = best?;
        let x = self.skyline[index].x;
        self.add_segment(index, Segment { x, y: y + padded_h, width: padded_w });

        Some(AtlasRect::new(x, y, width, height))
    }

    /// Places all rectangles, largest first, and returns the placements in
    /// input order.
    ///
    /// On failure the packer may hold a partial placement; start over with a
    /// fresh packer.
    pub fn pack_all(&mut self, sizes: &[(u32, u32)]) -> Result<Vec<AtlasRect>, PackError> {
        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|&a, &b| {
            let (aw, ah) = sizes[a];
            let (bw, bh) = sizes[b];
            bh.cmp(&ah).then(bw.cmp(&aw)).then(a.cmp(&b))
        });

        let mut placed = vec![AtlasRect::EMPTY; sizes.len()];
        for index in order {
            let (width, height) = sizes[index];
            placed[index] = self
                .pack(width, height)
                .ok_or(PackError::DoesNotFit { index, width, height })?;
        }

        Ok(placed)
    }

    /// Lowest point of the skyline, i.e. the height actually in use.
    pub fn used_height(&self) -> u32 {
        self.skyline.iter().map(|s| s.y).max().unwrap_or(0)
    }

    /// The y at which a padded rectangle resting on segment `index` would be
    /// placed, if it fits.
    fn fit(&self, index: usize, width: u32, height: u32) -> Option<u32> {
        let x = self.skyline[index].x;
        if x.checked_add(width).is_none_or(|right| right > self.width) {
            return None;
        }

        let mut y = 0;
        let mut remaining = width;
        for segment in &self.skyline[index..] {
            y = y.max(segment.y);
            if y.checked_add(height).is_none_or(|top| top > self.height) {
                return None;
            }
            if segment.width >= remaining {
                return Some(y);
            }
            remaining -= segment.width;
        }

        None
    }

    fn add_segment(&mut self, index: usize, segment: Segment) {
        self.skyline.insert(index, segment);

        // shrink or drop the segments now covered by the new one
        let end = segment.right();
        let mut i = index + 1;
        while i < self.skyline.len() {
            let next = &mut self.skyline[i];
            if next.x >= end {
                break;
            }

            let overlap = end - next.x;
            if next.width <= overlap {
                self.skyline.remove(i);
            } else {
                next.x += overlap;
                next.width -= overlap;
                break;
            }
        }

        self.merge();
    }

    fn merge(&mut self) {
        let mut i = 0;
        while i + 1 < self.skyline.len() {
            if self.skyline[i].y == self.skyline[i + 1].y {
                self.skyline[i].width += self.skyline[i + 1].width;
                self.skyline.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

/// Finds the smallest power-of-two atlas holding a set of rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasBuilder {
    pub padding: u32,
    pub max_size: u32,
}

impl Default for AtlasBuilder {
    fn default() -> Self {
        Self { padding: 1, max_size: DEFAULT_MAX_ATLAS_SIZE }
    }
}

impl AtlasBuilder {
    pub fn new(padding: u32, max_size: u32) -> Self {
        Self { padding, max_size }
    }

    /// Packs `sizes` into a texture starting at 64x64 and doubling the
    /// smaller side (width first) until everything fits.
    ///
    /// Returns the texture size and the placements in input order.
    pub fn pack(&self, sizes: &[(u32, u32)]) -> Result<((u32, u32), Vec<AtlasRect>), PackError> {
        let mut size = (
            MIN_ATLAS_SIZE.min(self.max_size),
            MIN_ATLAS_SIZE.min(self.max_size),
        );

        loop {
            let mut packer = SkylinePacker::new(size.0, size.1, self.padding);
            match packer.pack_all(sizes) {
                Ok(placed) => {
                    debug!(width = size.0, height = size.1, rects = sizes.len(), "packed atlas");
                    return Ok((size, placed));
                },
                Err(e) => {
                    debug!(width = size.0, height = size.1, error = %e, "atlas too small, growing");
                    size = self
                        .grow(size)
                        .ok_or(PackError::AtlasTooSmall { max_size: self.max_size })?;
                },
            }
        }
    }

    fn grow(&self, (width, height): (u32, u32)) -> Option<(u32, u32)> {
        let max = self.max_size;
        if width <= height && width < max {
            Some(((width * 2).min(max), height))
        } else if height < max {
            Some((width, (height * 2).min(max)))
        } else if width < max {
            Some(((width * 2).min(max), height))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Asserts that no two rectangles come closer than `padding` and that
    /// all keep `padding` to the area edges.
    fn assert_valid(rects: &[AtlasRect], (width, height): (u32, u32), padding: u32) {
        let visible: Vec<_> = rects.iter().filter(|r| !r.is_empty()).collect();

        for r in &visible {
            assert!(r.x >= padding && r.y >= padding, "{r:?} touches the top/left edge");
            assert!(r.right() + padding <= width, "{r:?} exceeds width {width}");
            assert!(r.bottom() + padding <= height, "{r:?} exceeds height {height}");
        }

        for (i, a) in visible.iter().enumerate() {
            for b in &visible[i + 1..] {
                let grown = AtlasRect::new(a.x, a.y, a.width + padding, a.height + padding);
                let other = AtlasRect::new(b.x, b.y, b.width + padding, b.height + padding);
                assert!(!grown.intersects(&other), "{a:?} and {b:?} are closer than {padding}px");
            }
        }
    }

    /// Deterministic pseudo-random glyph-like sizes.
    fn glyph_sizes(count: usize) -> Vec<(u32, u32)> {
        let mut state = 0x2545_f491_u32;
        (0..count)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (3 + state % 14, 5 + (state >> 8) % 18)
            })
            .collect()
    }

    #[test]
    fn first_rect_goes_to_the_padded_corner() {
        let mut packer = SkylinePacker::new(64, 64, 2);
        assert_eq!(packer.pack(10, 12), Some(AtlasRect::new(2, 2, 10, 12)));
        assert_eq!(packer.pack(10, 12), Some(AtlasRect::new(14, 2, 10, 12)));
    }

    #[test]
    fn prefers_the_lowest_resulting_top() {
        let mut packer = SkylinePacker::new(32, 32, 0);
        assert_eq!(packer.pack(16, 10), Some(AtlasRect::new(0, 0, 16, 10)));
        assert_eq!(packer.pack(16, 4), Some(AtlasRect::new(16, 0, 16, 4)));

        // resting on the short column beats stacking on the tall one
        assert_eq!(packer.pack(16, 4), Some(AtlasRect::new(16, 4, 16, 4)));
        // a wide rect has to clear both columns
        assert_eq!(packer.pack(32, 2), Some(AtlasRect::new(0, 10, 32, 2)));
        assert_eq!(packer.used_height(), 12);
    }

    #[test]
    fn merges_segments_of_equal_height() {
        let mut packer = SkylinePacker::new(16, 16, 0);
        packer.pack(8, 4).unwrap();
        packer.pack(8, 4).unwrap();
        assert_eq!(packer.skyline, vec![Segment { x: 0, y: 4, width: 16 }]);

        // the merged segment accepts a full-width rect
        assert_eq!(packer.pack(16, 4), Some(AtlasRect::new(0, 4, 16, 4)));
    }

    #[test]
    fn fills_exactly_and_then_refuses() {
        let mut packer = SkylinePacker::new(16, 16, 0);
        for _ in 0..4 {
            assert!(packer.pack(8, 8).is_some());
        }
        assert_eq!(packer.pack(1, 1), None);
    }

    #[test]
    fn oversized_rects_do_not_fit() {
        let mut packer = SkylinePacker::new(32, 32, 1);
        assert_eq!(packer.pack(31, 4), None, "padding on both sides leaves 30px");
        assert!(packer.pack(30, 4).is_some());
        assert_eq!(packer.pack(4, 40), None);
    }

    #[test]
    fn huge_rects_are_refused_without_overflow() {
        let mut packer = SkylinePacker::new(64, 64, 2);
        assert_eq!(packer.pack(u32::MAX, 4), None);
        assert_eq!(packer.pack(4, u32::MAX - 1), None);
        assert_eq!(packer.pack(10, 12), Some(AtlasRect::new(2, 2, 10, 12)));
    }

    #[test]
    fn zero_sized_rects_take_no_space() {
        let mut packer = SkylinePacker::new(8, 8, 0);
        assert_eq!(packer.pack(0, 5), Some(AtlasRect::EMPTY));
        assert_eq!(packer.pack(5, 0), Some(AtlasRect::EMPTY));
        assert_eq!(packer.pack(8, 8), Some(AtlasRect::new(0, 0, 8, 8)));
    }

    #[test]
    fn padding_larger_than_the_area_fits_nothing() {
        let mut packer = SkylinePacker::new(4, 4, 4);
        assert_eq!(packer.pack(1, 1), None);
    }

    #[test]
    fn pack_all_returns_input_order() {
        let sizes = [(4, 2), (4, 8), (4, 4)];
        let mut packer = SkylinePacker::new(32, 32, 0);
        let placed = packer.pack_all(&sizes).unwrap();

        let placed_sizes: Vec<_> = placed.iter().map(|r| (r.width, r.height)).collect();
        assert_eq!(placed_sizes, sizes);
        // tallest goes first, into the corner
        assert_eq!((placed[1].x, placed[1].y), (0, 0));
    }

    #[test]
    fn pack_all_reports_the_rect_that_failed() {
        let mut packer = SkylinePacker::new(16, 16, 0);
        let err = packer.pack_all(&[(8, 8), (20, 2)]).unwrap_err();
        assert_eq!(err, PackError::DoesNotFit { index: 1, width: 20, height: 2 });
    }

    #[test]
    fn many_glyphs_never_overlap() {
        for padding in [0, 1, 3] {
            let sizes = glyph_sizes(300);
            let mut packer = SkylinePacker::new(512, 512, padding);
            let placed = packer.pack_all(&sizes).unwrap();

            assert_valid(&placed, packer.size(), padding);
        }
    }

    #[test]
    fn builder_grows_in_powers_of_two() {
        let sizes = glyph_sizes(400);
        let builder = AtlasBuilder::new(1, 4096);
        let ((width, height), placed) = builder.pack(&sizes).unwrap();

        assert!(width.is_power_of_two() && height.is_power_of_two());
        assert!(width >= height, "width grows first");
        assert!(width > MIN_ATLAS_SIZE);
        assert_valid(&placed, (width, height), 1);
    }

    #[test]
    fn builder_keeps_small_sets_at_the_minimum_size() {
        let (size, placed) = AtlasBuilder::default().pack(&[(10, 10), (0, 0)]).unwrap();
        assert_eq!(size, (MIN_ATLAS_SIZE, MIN_ATLAS_SIZE));
        assert_eq!(placed[1], AtlasRect::EMPTY);
    }

    #[test]
    fn builder_gives_up_at_the_maximum() {
        let err = AtlasBuilder::new(0, 128).pack(&[(100, 100), (100, 100)]).unwrap_err();
        assert_eq!(err, PackError::AtlasTooSmall { max_size: 128 });
    }

    #[test]
    fn growth_alternates_sides() {
        let builder = AtlasBuilder::new(0, 256);
        assert_eq!(builder.grow((64, 64)), Some((128, 64)));
        assert_eq!(builder.grow((128, 64)), Some((128, 128)));
        assert_eq!(builder.grow((256, 128)), Some((256, 256)));
        assert_eq!(builder.grow((256, 256)), None);
    }
}
