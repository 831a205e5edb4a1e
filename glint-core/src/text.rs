//! Text meshes built from a [`FontAtlasData`].
//!
//! Layout works in y-down pixel space, matching
//! [`Mat4::orthographic_from_size`](crate::Mat4::orthographic_from_size):
//! the origin is the top-left corner of the first line.

use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glint_data::FontAtlasData;

use crate::{
    error::Error,
    gl::{
        AttributeFormat, GlState, LayoutError, ScalarType, Texture2D, TextureFilter,
        TextureFormat, TextureWrap, Vertex, VertexLayout,
    },
};

/// Glyph substituted for characters missing from the atlas.
pub const FALLBACK_GLYPH: char = '?';

/// Vertex of a glyph quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TextVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

impl TextVertex {
    pub const POSITION: u32 = 0;
    pub const UV: u32 = 1;
    pub const COLOR: u32 = 2;
}

impl Vertex for TextVertex {
    fn layout() -> Result<VertexLayout, LayoutError> {
        VertexLayout::builder()
            .attribute_at(
                Self::POSITION,
                AttributeFormat::float(2),
                offset_of!(Self, position) as u32,
            )
            .attribute_at(Self::UV, AttributeFormat::float(2), offset_of!(Self, uv) as u32)
            .attribute_at(
                Self::COLOR,
                AttributeFormat::normalized(ScalarType::U8, 4),
                offset_of!(Self, color) as u32,
            )
            .stride(size_of::<Self>() as u32)
            .build()
    }
}

/// Pixel-space rectangle, `y` growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Quads for a laid out string; four vertices and six indices per visible
/// glyph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextMesh {
    pub vertices: Vec<TextVertex>,
    pub indices: Vec<u32>,
    /// Logical extent: pen advance horizontally, whole lines vertically
    pub bounds: TextBounds,
}

impl TextMesh {
    pub fn glyph_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Appends another mesh, rebasing its indices.
    pub fn extend(&mut self, other: &TextMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));

        if self.bounds == TextBounds::default() {
            self.bounds = other.bounds;
        } else {
            let right = (self.bounds.x + self.bounds.width).max(other.bounds.x + other.bounds.width);
            let bottom =
                (self.bounds.y + self.bounds.height).max(other.bounds.y + other.bounds.height);
            self.bounds.x = self.bounds.x.min(other.bounds.x);
            self.bounds.y = self.bounds.y.min(other.bounds.y);
            self.bounds.width = right - self.bounds.x;
            self.bounds.height = bottom - self.bounds.y;
        }
    }
}

/// Turns strings into glyph quads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    /// Multiplier applied to the atlas' pixel metrics
    pub scale: f32,
    pub color: [u8; 4],
    /// Width of a tab, in spaces
    pub tab_width: u32,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self { scale: 1.0, color: [255; 4], tab_width: 4 }
    }
}

impl TextLayout {
    pub fn new(scale: f32) -> Self {
        Self { scale, ..Self::default() }
    }

    pub fn with_color(self, color: [u8; 4]) -> Self {
        Self { color, ..self }
    }

    /// Lays out `text` with its first line's top-left corner at `origin`.
    ///
    /// The pen advances by each glyph's advance plus the kerning against the
    /// previous character. `\n` starts a new line one line height below.
    /// Characters missing from the atlas are drawn as [`FALLBACK_GLYPH`], or
    /// skipped when the atlas lacks that too.
    pub fn layout(&self, atlas: &FontAtlasData, text: &str, origin: (f32, f32)) -> TextMesh {
        let scale = self.scale;
        let line_height = atlas.line_height() * scale;
        let ascent = atlas.line_metrics.ascent * scale;
        let space_advance = atlas.glyph(' ').map_or(0.0, |g| g.advance);

        let mut mesh = TextMesh::default();
        let (mut pen_x, mut line_top) = origin;
        let mut max_x = origin.0;
        let mut lines = 1;
        let mut prev: Option<char> = None;

        for ch in text.chars() {
            match ch {
                '\n' => {
                    pen_x = origin.0;
                    line_top += line_height;
                    lines += 1;
                    prev = None;
                    continue;
                },
                '\r' => continue,
                '\t' => {
                    pen_x += space_advance * self.tab_width as f32 * scale;
                    max_x = max_x.max(pen_x);
                    prev = None;
                    continue;
                },
                _ => {},
            }

            let Some(glyph) = atlas.glyph(ch).or_else(|| atlas.glyph(FALLBACK_GLYPH)) else {
                continue;
            };

            if let Some(prev) = prev {
                pen_x += atlas.kerning(prev, glyph.symbol) * scale;
            }

            if !glyph.is_blank() {
                let baseline = line_top + ascent;
                let x0 = pen_x + glyph.bearing.0 as f32 * scale;
                let x1 = x0 + glyph.rect.width as f32 * scale;
                let y1 = baseline - glyph.bearing.1 as f32 * scale;
                let y0 = y1 - glyph.rect.height as f32 * scale;
                let (u0, v0, u1, v1) = glyph.rect.uv(atlas.texture_size);

                self.push_quad(&mut mesh, [x0, y0, x1, y1], [u0, v0, u1, v1]);
            }

            pen_x += glyph.advance * scale;
            max_x = max_x.max(pen_x);
            prev = Some(glyph.symbol);
        }

        mesh.bounds = TextBounds {
            x: origin.0,
            y: origin.1,
            width: max_x - origin.0,
            height: lines as f32 * line_height,
        };
        mesh
    }

    /// Size of the laid out text without building vertices.
    pub fn measure(&self, atlas: &FontAtlasData, text: &str) -> (f32, f32) {
        let bounds = self.layout(atlas, text, (0.0, 0.0)).bounds;
        (bounds.width, bounds.height)
    }

    fn push_quad(&self, mesh: &mut TextMesh, [x0, y0, x1, y1]: [f32; 4], [u0, v0, u1, v1]: [f32; 4]) {
        let base = mesh.vertices.len() as u32;
        let color = self.color;

        mesh.vertices.extend_from_slice(&[
            TextVertex { position: [x0, y0], uv: [u0, v0], color },
            TextVertex { position: [x1, y0], uv: [u1, v0], color },
            TextVertex { position: [x0, y1], uv: [u0, v1], color },
            TextVertex { position: [x1, y1], uv: [u1, v1], color },
        ]);
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
    }
}

/// A font atlas uploaded as a single-channel coverage texture.
#[derive(Debug)]
#[must_use = "call `delete(gl)` before dropping to avoid GPU resource leaks"]
pub struct FontTexture {
    texture: Texture2D,
}

impl FontTexture {
    pub fn new(gl: &glow::Context, atlas: &FontAtlasData) -> Result<Self, Error> {
        let (width, height) = atlas.texture_size;
        let texture = Texture2D::new(
            gl,
            width as i32,
            height as i32,
            TextureFormat::R8,
            Some(&atlas.texture_data),
        )?;
        texture.set_sampling(gl, TextureFilter::Linear, TextureWrap::ClampToEdge);

        tracing::debug!(
            font = %atlas.font_name,
            width,
            height,
            glyphs = atlas.glyphs.len(),
            "uploaded font atlas"
        );
        Ok(Self { texture })
    }

    pub fn bind(&self, gl: &glow::Context, state: &mut GlState, unit: u32) {
        self.texture.bind(gl, state, unit);
    }

    pub fn texture(&self) -> &Texture2D {
        &self.texture
    }

    pub fn delete(self, gl: &glow::Context) {
        self.texture.delete(gl);
    }
}

#[cfg(test)]
mod tests {
    use glint_data::{AtlasRect, GlyphEntry, KerningPair, LineMetrics};

    use super::*;

    fn glyph(symbol: char, rect: AtlasRect, bearing: (i32, i32), advance: f32) -> GlyphEntry {
        GlyphEntry { symbol, rect, bearing, advance }
    }

    /// 64x64 atlas: ascent 8, descent -2, no gap => line height 10.
    fn atlas() -> FontAtlasData {
        let glyphs = vec![
            glyph(' ', AtlasRect::EMPTY, (0, 0), 4.0),
            glyph('A', AtlasRect::new(0, 0, 6, 8), (0, 0), 7.0),
            glyph('V', AtlasRect::new(8, 0, 6, 8), (1, 0), 7.0),
            glyph('g', AtlasRect::new(16, 0, 5, 8), (0, -2), 6.0),
            glyph('?', AtlasRect::new(24, 0, 4, 8), (0, 0), 5.0),
        ];
        let kerning = vec![KerningPair { left: 'A', right: 'V', adjust: -1.5 }];

        FontAtlasData::new(
            "Test Sans",
            10.0,
            LineMetrics::new(8.0, -2.0, 0.0),
            (64, 64),
            glyphs,
            kerning,
            vec![0; 64 * 64],
        )
    }

    #[test]
    fn text_vertex_layout_matches_struct() {
        let layout = TextVertex::layout().unwrap();
        assert_eq!(layout.stride(), 20);

        let offsets: Vec<_> = layout.attributes().iter().map(|a| (a.location, a.offset)).collect();
        assert_eq!(offsets, vec![(0, 0), (1, 8), (2, 16)]);
    }

    #[test]
    fn quads_are_positioned_on_the_baseline() {
        let mesh = TextLayout::default().layout(&atlas(), "A", (10.0, 20.0));

        assert_eq!(mesh.glyph_count(), 1);
        assert_eq!(mesh.indices, vec![0, 1, 2, 2, 1, 3]);

        // baseline at 20 + 8; glyph sits on it
        let tl = mesh.vertices[0];
        let br = mesh.vertices[3];
        assert_eq!(tl.position, [10.0, 20.0]);
        assert_eq!(br.position, [16.0, 28.0]);
        assert_eq!(tl.uv, [0.0, 0.0]);
        assert_eq!(br.uv, [6.0 / 64.0, 8.0 / 64.0]);
    }

    #[test]
    fn descenders_extend_below_the_baseline() {
        let mesh = TextLayout::default().layout(&atlas(), "g", (0.0, 0.0));
        assert_eq!(mesh.vertices[0].position[1], 2.0);
        assert_eq!(mesh.vertices[3].position[1], 10.0);
    }

    #[test]
    fn kerning_adjusts_the_pen() {
        let atlas = atlas();
        let mesh = TextLayout::default().layout(&atlas, "AV", (0.0, 0.0));

        // 'V' starts at 7 - 1.5 with a bearing of 1
        assert_eq!(mesh.vertices[4].position[0], 6.5);
        assert_eq!(mesh.bounds.width, 12.5);

        let unkerned = TextLayout::default().layout(&atlas, "VA", (0.0, 0.0));
        assert_eq!(unkerned.bounds.width, 14.0);
    }

    #[test]
    fn scale_applies_to_metrics_and_kerning() {
        let mesh = TextLayout::new(2.0).layout(&atlas(), "AV", (0.0, 0.0));
        assert_eq!(mesh.bounds.width, 25.0);
        assert_eq!(mesh.bounds.height, 20.0);
        assert_eq!(mesh.vertices[3].position, [12.0, 16.0]);
    }

    #[test]
    fn newlines_reset_the_pen_and_kerning() {
        let mesh = TextLayout::default().layout(&atlas(), "A\nV", (5.0, 0.0));

        assert_eq!(mesh.glyph_count(), 2);
        // second line: x back at origin + bearing, one line height down
        assert_eq!(mesh.vertices[4].position, [6.0, 10.0]);
        assert_eq!(mesh.bounds.height, 20.0);
        assert_eq!(mesh.bounds.width, 7.0);
    }

    #[test]
    fn spaces_and_tabs_advance_without_quads() {
        let layout = TextLayout::default();
        let atlas = atlas();

        let mesh = layout.layout(&atlas, " A", (0.0, 0.0));
        assert_eq!(mesh.glyph_count(), 1);
        assert_eq!(mesh.vertices[0].position[0], 4.0);

        let mesh = layout.layout(&atlas, "\tA", (0.0, 0.0));
        assert_eq!(mesh.vertices[0].position[0], 16.0);
    }

    #[test]
    fn unknown_chars_use_the_fallback_glyph() {
        let atlas = atlas();
        let mesh = TextLayout::default().layout(&atlas, "Aé", (0.0, 0.0));

        assert_eq!(mesh.glyph_count(), 2);
        assert_eq!(mesh.vertices[4].uv[0], 24.0 / 64.0);
        assert_eq!(mesh.bounds.width, 12.0);
    }

    #[test]
    fn unknown_chars_are_skipped_without_fallback() {
        let mut atlas = atlas();
        atlas.glyphs.retain(|g| g.symbol != FALLBACK_GLYPH);

        let mesh = TextLayout::default().layout(&atlas, "éA", (0.0, 0.0));
        assert_eq!(mesh.glyph_count(), 1);
        assert_eq!(mesh.vertices[0].position[0], 0.0);
    }

    #[test]
    fn vertices_carry_the_layout_color() {
        let red = [255, 0, 0, 255];
        let mesh = TextLayout::default().with_color(red).layout(&atlas(), "AV", (0.0, 0.0));
        assert!(mesh.vertices.iter().all(|v| v.color == red));
    }

    #[test]
    fn empty_text_has_one_line_of_height() {
        let layout = TextLayout::default();
        let mesh = layout.layout(&atlas(), "", (0.0, 0.0));
        assert!(mesh.is_empty());
        assert_eq!(layout.measure(&atlas(), ""), (0.0, 10.0));
    }

    #[test]
    fn meshes_concatenate_with_rebased_indices() {
        let layout = TextLayout::default();
        let atlas = atlas();

        let mut mesh = layout.layout(&atlas, "A", (0.0, 0.0));
        mesh.extend(&layout.layout(&atlas, "V", (0.0, 30.0)));

        assert_eq!(mesh.glyph_count(), 2);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 6, 5, 7]);
        assert_eq!(mesh.bounds, TextBounds { x: 0.0, y: 0.0, width: 7.0, height: 40.0 });
    }
}
