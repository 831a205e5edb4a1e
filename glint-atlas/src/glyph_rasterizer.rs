use fontdue::{Font, FontSettings};
use glint_data::LineMetrics;

use crate::{AtlasError, font_source::FontData};

/// Coverage bitmap and placement metrics of one character.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    pub symbol: char,
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position to the left edge of the bitmap
    pub xmin: i32,
    /// Offset from the baseline to the bottom edge of the bitmap, y-up
    pub ymin: i32,
    pub advance: f32,
    /// `width * height` coverage values, top row first
    pub coverage: Vec<u8>,
}

impl RasterizedGlyph {
    pub fn is_blank(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Rasterizes characters of a single font at a fixed pixel size.
pub struct GlyphRasterizer {
    font: Font,
    px: f32,
}

impl GlyphRasterizer {
    pub fn new(font: &FontData, px: f32) -> Result<Self, AtlasError> {
        if !(px.is_finite() && px > 0.0) {
            return Err(AtlasError::InvalidConfig(format!("font size must be positive, got {px}")));
        }

        let settings = FontSettings {
            collection_index: font.index,
            scale: px,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(font.data.as_slice(), settings)
            .map_err(|e| AtlasError::FontParse(e.to_string()))?;

        Ok(Self { font, px })
    }

    pub fn px(&self) -> f32 {
        self.px
    }

    /// Whether the font maps `symbol` to a real glyph rather than `.notdef`.
    pub fn has_glyph(&self, symbol: char) -> bool {
        self.font.lookup_glyph_index(symbol) != 0
    }

    pub fn rasterize(&self, symbol: char) -> RasterizedGlyph {
        let (metrics, coverage) = self.font.rasterize(symbol, self.px);

        RasterizedGlyph {
            symbol,
            width: metrics.width as u32,
            height: metrics.height as u32,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance: metrics.advance_width,
            coverage,
        }
    }

    /// Ascent, descent and line gap at the rasterization size.
    ///
    /// Fonts without horizontal metrics get an 80/20 split of the size.
    pub fn line_metrics(&self) -> LineMetrics {
        match self.font.horizontal_line_metrics(self.px) {
            Some(m) => LineMetrics::new(m.ascent, m.descent, m.line_gap),
            None => LineMetrics::new(self.px * 0.8, -self.px * 0.2, 0.0),
        }
    }

    /// Horizontal kerning between two characters, if the font defines one.
    pub fn kerning(&self, left: char, right: char) -> Option<f32> {
        self.font.horizontal_kern(left, right, self.px)
    }

    /// Name stored in the font's naming table.
    pub fn font_name(&self) -> Option<&str> {
        self.font.name()
    }
}

impl std::fmt::Debug for GlyphRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphRasterizer")
            .field("font", &self.font.name())
            .field("px", &self.px)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font_data(data: Vec<u8>) -> FontData {
        FontData { name: "broken".into(), data, index: 0 }
    }

    #[test]
    fn rejects_garbage_font_data() {
        let err = GlyphRasterizer::new(&font_data(vec![0xde, 0xad, 0xbe, 0xef]), 16.0).unwrap_err();
        assert!(matches!(err, AtlasError::FontParse(_)), "{err}");
    }

    #[test]
    fn rejects_non_positive_sizes() {
        for px in [0.0, -4.0, f32::NAN] {
            let err = GlyphRasterizer::new(&font_data(Vec::new()), px).unwrap_err();
            assert!(matches!(err, AtlasError::InvalidConfig(_)), "{px}: {err}");
        }
    }

    #[test]
    fn blank_glyphs_have_no_area() {
        let glyph = RasterizedGlyph {
            symbol: ' ',
            width: 0,
            height: 0,
            xmin: 0,
            ymin: 0,
            advance: 4.0,
            coverage: Vec::new(),
        };
        assert!(glyph.is_blank());
    }
}
