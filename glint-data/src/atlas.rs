use std::fmt::Debug;

use compact_str::CompactString;

use crate::{
    Deserializer, FontAtlasDeserializationError, GlyphEntry, KerningPair, Serializable,
};

/// Font atlas data for GPU text rendering.
///
/// Holds a single-channel coverage texture into which every glyph bitmap has
/// been packed, together with per-glyph placement and advance metrics and
/// the kerning pairs extracted from the font. Glyphs are kept sorted by
/// character and kerning pairs by `(left, right)` so that lookups are binary
/// searches.
#[derive(PartialEq)]
pub struct FontAtlasData {
    /// The name of the font
    pub font_name: CompactString,
    /// The rasterization size in pixels
    pub font_size: f32,
    /// Vertical metrics of the font at `font_size`
    pub line_metrics: LineMetrics,
    /// Width and height of the texture in pixels
    pub texture_size: (u32, u32),
    /// The glyphs in the atlas, sorted by symbol
    pub glyphs: Vec<GlyphEntry>,
    /// Non-zero kerning pairs, sorted by `(left, right)`
    pub kerning: Vec<KerningPair>,
    /// 8-bit coverage values, `width * height` bytes, row-major, top row first
    pub texture_data: Vec<u8>,
}

impl Debug for FontAtlasData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontAtlasData")
            .field("font_name", &self.font_name)
            .field("font_size", &self.font_size)
            .field("line_metrics", &self.line_metrics)
            .field("texture_size", &self.texture_size)
            .field("glyphs_count", &self.glyphs.len())
            .field("kerning_pairs", &self.kerning.len())
            .field("texture_data_kb", &(self.texture_data.len() / 1024))
            .finish()
    }
}

impl FontAtlasData {
    /// Assembles atlas data, sorting glyphs and kerning pairs for lookup.
    ///
    /// Duplicate symbols keep their first occurrence; kerning pairs with a
    /// zero adjustment are dropped.
    pub fn new(
        font_name: impl Into<CompactString>,
        font_size: f32,
        line_metrics: LineMetrics,
        texture_size: (u32, u32),
        mut glyphs: Vec<GlyphEntry>,
        mut kerning: Vec<KerningPair>,
        texture_data: Vec<u8>,
    ) -> Self {
        glyphs.sort_by_key(|g| g.symbol);
        glyphs.dedup_by_key(|g| g.symbol);

        kerning.retain(|k| k.adjust != 0.0);
        kerning.sort_by_key(KerningPair::key);
        kerning.dedup_by_key(|k| k.key());

        Self {
            font_name: font_name.into(),
            font_size,
            line_metrics,
            texture_size,
            glyphs,
            kerning,
            texture_data,
        }
    }

    /// Deserializes a font atlas from binary format.
    ///
    /// # Arguments
    /// * `serialized` - Binary data containing the serialized font atlas
    ///
    /// # Returns
    /// The deserialized font atlas or an error if deserialization fails
    pub fn from_binary(serialized: &[u8]) -> Result<Self, FontAtlasDeserializationError> {
        let payload = Deserializer::unwrap_container(serialized).map_err(|e| {
            FontAtlasDeserializationError {
                message: format!("Failed to deserialize font atlas: {e}"),
            }
        })?;

        let mut deserializer = Deserializer::new(&payload);
        FontAtlasData::deserialize(&mut deserializer).map_err(|e| FontAtlasDeserializationError {
            message: format!("Failed to deserialize font atlas: {e}"),
        })
    }

    /// Serializes the font atlas to binary format.
    ///
    /// # Returns
    /// A byte vector containing the serialized font atlas data
    pub fn to_binary(&self) -> Vec<u8> {
        self.serialize()
    }

    /// Looks up the glyph for a character.
    pub fn glyph(&self, symbol: char) -> Option<&GlyphEntry> {
        self.glyphs
            .binary_search_by_key(&symbol, |g| g.symbol)
            .ok()
            .map(|idx| &self.glyphs[idx])
    }

    /// Returns the kerning adjustment between two characters, or `0.0` if the
    /// font defines none.
    pub fn kerning(&self, left: char, right: char) -> f32 {
        self.kerning
            .binary_search_by_key(&(left, right), KerningPair::key)
            .map(|idx| self.kerning[idx].adjust)
            .unwrap_or(0.0)
    }

    /// Distance between consecutive baselines.
    pub fn line_height(&self) -> f32 {
        self.line_metrics.line_height()
    }

    /// Fraction of texture pixels covered by glyph rectangles.
    pub fn fill_ratio(&self) -> f32 {
        let (w, h) = self.texture_size;
        if w == 0 || h == 0 {
            return 0.0;
        }

        let used: u64 = self
            .glyphs
            .iter()
            .map(|g| g.rect.width as u64 * g.rect.height as u64)
            .sum();

        used as f32 / (w as u64 * h as u64) as f32
    }
}

/// Vertical font metrics in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LineMetrics {
    /// Distance from the baseline to the top of the tallest glyphs
    pub ascent: f32,
    /// Distance from the baseline to the lowest descender; negative
    pub descent: f32,
    /// Extra spacing between the descent of one line and the ascent of the next
    pub line_gap: f32,
}

impl LineMetrics {
    pub fn new(ascent: f32, descent: f32, line_gap: f32) -> Self {
        Self { ascent, descent, line_gap }
    }

    pub fn line_height(&self) -> f32 {
        self.ascent - self.descent + self.line_gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AtlasRect;

    fn glyph(symbol: char, advance: f32) -> GlyphEntry {
        GlyphEntry {
            symbol,
            rect: AtlasRect::new(0, 0, 4, 4),
            bearing: (0, 0),
            advance,
        }
    }

    fn kern(left: char, right: char, adjust: f32) -> KerningPair {
        KerningPair { left, right, adjust }
    }

    fn atlas() -> FontAtlasData {
        FontAtlasData::new(
            "Test Sans",
            16.0,
            LineMetrics::new(12.0, -4.0, 2.0),
            (16, 16),
            vec![glyph('b', 8.0), glyph('a', 7.0), glyph('a', 99.0), glyph('V', 9.0)],
            vec![kern('V', 'a', -1.5), kern('A', 'V', -2.0), kern('a', 'b', 0.0)],
            vec![0; 256],
        )
    }

    #[test]
    fn glyphs_are_sorted_and_deduplicated() {
        let atlas = atlas();
        let symbols: Vec<char> = atlas.glyphs.iter().map(|g| g.symbol).collect();
        assert_eq!(symbols, vec!['V', 'a', 'b']);
        assert_eq!(atlas.glyph('a').map(|g| g.advance), Some(7.0));
        assert!(atlas.glyph('z').is_none());
    }

    #[test]
    fn kerning_lookup() {
        let atlas = atlas();
        assert_eq!(atlas.kerning.len(), 2, "zero pairs are dropped");
        assert_eq!(atlas.kerning('V', 'a'), -1.5);
        assert_eq!(atlas.kerning('A', 'V'), -2.0);
        assert_eq!(atlas.kerning('a', 'V'), 0.0);
        assert_eq!(atlas.kerning('a', 'b'), 0.0);
    }

    #[test]
    fn line_height_includes_gap() {
        assert_eq!(atlas().line_height(), 18.0);
    }

    #[test]
    fn fill_ratio() {
        // 3 glyphs * 16 px = 48 of 256 px
        assert_eq!(atlas().fill_ratio(), 48.0 / 256.0);
    }
}
