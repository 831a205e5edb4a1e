use glint_data::{AtlasRect, FontAtlasData, GlyphEntry};
use tracing::{debug, info, warn};

use crate::{
    AtlasError,
    charset::Charset,
    font_source::FontData,
    glyph_rasterizer::{GlyphRasterizer, RasterizedGlyph},
    kerning::extract_kerning,
    packer::{AtlasBuilder, DEFAULT_MAX_ATLAS_SIZE},
};

/// Parameters of a generated atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasConfig {
    /// Rasterization size in pixels
    pub font_size: f32,
    /// Free pixels around every glyph
    pub padding: u32,
    /// Upper bound for both texture dimensions
    pub max_texture_size: u32,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            font_size: 32.0,
            padding: 1,
            max_texture_size: DEFAULT_MAX_ATLAS_SIZE,
        }
    }
}

impl AtlasConfig {
    pub fn validate(&self) -> Result<(), AtlasError> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(AtlasError::InvalidConfig(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if !self.max_texture_size.is_power_of_two() {
            return Err(AtlasError::InvalidConfig(format!(
                "max texture size must be a power of two, got {}",
                self.max_texture_size
            )));
        }
        if self.padding >= self.max_texture_size / 2 {
            return Err(AtlasError::InvalidConfig(format!(
                "padding {} is too large for a {} texture",
                self.padding, self.max_texture_size
            )));
        }

        Ok(())
    }
}

/// Summary of an atlas generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    pub font_name: String,
    /// Glyphs stored in the atlas, blank ones included
    pub glyph_count: usize,
    /// Requested characters the font has no glyph for
    pub missing: Vec<char>,
    pub kerning_pairs: usize,
    pub texture_size: (u32, u32),
    /// Fraction of texture pixels covered by glyph bitmaps
    pub fill_ratio: f32,
}

/// Builds [`FontAtlasData`] from a font and a charset.
#[derive(Debug)]
pub struct AtlasGenerator {
    rasterizer: GlyphRasterizer,
    font_name: String,
    config: AtlasConfig,
}

impl AtlasGenerator {
    pub fn new(font: &FontData, config: AtlasConfig) -> Result<Self, AtlasError> {
        config.validate()?;
        let rasterizer = GlyphRasterizer::new(font, config.font_size)?;

        let font_name = rasterizer
            .font_name()
            .map_or_else(|| font.name.clone(), str::to_string);

        Ok(Self { rasterizer, font_name, config })
    }

    pub fn font_name(&self) -> &str {
        &self.font_name
    }

    /// Rasterizes, packs and kerns every supported character of `charset`.
    pub fn generate(&self, charset: &Charset) -> Result<(FontAtlasData, GenerationReport), AtlasError> {
        let (glyphs, missing): (Vec<_>, Vec<_>) = charset
            .chars()
            .iter()
            .copied()
            .partition(|&c| c == ' ' || self.rasterizer.has_glyph(c));

        if !missing.is_empty() {
            warn!(
                font = %self.font_name,
                count = missing.len(),
                "font has no glyphs for some requested characters"
            );
        }
        if glyphs.is_empty() {
            return Err(AtlasError::NoGlyphs);
        }

        let rasterized: Vec<RasterizedGlyph> =
            glyphs.iter().map(|&c| self.rasterizer.rasterize(c)).collect();
        debug!(glyphs = rasterized.len(), "rasterized glyphs");

        let sizes: Vec<(u32, u32)> = rasterized
            .iter()
            .map(|g| if g.is_blank() { (0, 0) } else { (g.width, g.height) })
            .collect();
        let builder = AtlasBuilder::new(self.config.padding, self.config.max_texture_size);
        let (texture_size, placements) = builder.pack(&sizes)?;

        let texture_data = compose_texture(texture_size, &rasterized, &placements);

        let entries: Vec<GlyphEntry> = rasterized
            .iter()
            .zip(&placements)
            .map(|(glyph, rect)| GlyphEntry {
                symbol: glyph.symbol,
                rect: *rect,
                bearing: (glyph.xmin, glyph.ymin),
                advance: glyph.advance,
            })
            .collect();

        let kerning = extract_kerning(&glyphs, |l, r| self.rasterizer.kerning(l, r));

        let atlas = FontAtlasData::new(
            self.font_name.as_str(),
            self.config.font_size,
            self.rasterizer.line_metrics(),
            texture_size,
            entries,
            kerning,
            texture_data,
        );

        let report = GenerationReport {
            font_name: self.font_name.clone(),
            glyph_count: atlas.glyphs.len(),
            missing,
            kerning_pairs: atlas.kerning.len(),
            texture_size,
            fill_ratio: atlas.fill_ratio(),
        };
        info!(
            font = %report.font_name,
            glyphs = report.glyph_count,
            kerning_pairs = report.kerning_pairs,
            width = texture_size.0,
            height = texture_size.1,
            fill_ratio = report.fill_ratio,
            "generated font atlas"
        );

        Ok((atlas, report))
    }
}

/// Copies the glyph bitmaps into a single-channel texture at their packed
/// positions.
fn compose_texture(
    (width, height): (u32, u32),
    glyphs: &[RasterizedGlyph],
    placements: &[AtlasRect],
) -> Vec<u8> {
    let stride = width as usize;
    let mut texture = vec![0u8; stride * height as usize];

    for (glyph, rect) in glyphs.iter().zip(placements) {
        if rect.is_empty() {
            continue;
        }

        let row_len = rect.width as usize;
        for (row, src) in glyph.coverage.chunks_exact(row_len).enumerate() {
            let start = (rect.y as usize + row) * stride + rect.x as usize;
            texture[start..start + row_len].copy_from_slice(src);
        }
    }

    texture
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(symbol: char, width: u32, height: u32, value: u8) -> RasterizedGlyph {
        RasterizedGlyph {
            symbol,
            width,
            height,
            xmin: 0,
            ymin: 0,
            advance: width as f32,
            coverage: vec![value; (width * height) as usize],
        }
    }

    #[test]
    fn composes_bitmaps_at_their_placements() {
        let glyphs = [glyph('a', 2, 2, 7), glyph(' ', 0, 0, 0), glyph('b', 1, 3, 9)];
        let placements = [
            AtlasRect::new(1, 1, 2, 2),
            AtlasRect::EMPTY,
            AtlasRect::new(4, 0, 1, 3),
        ];

        let texture = compose_texture((6, 4), &glyphs, &placements);

        #[rustfmt::skip]
        let expected = vec![
            0, 0, 0, 0, 9, 0,
            0, 7, 7, 0, 9, 0,
            0, 7, 7, 0, 9, 0,
            0, 0, 0, 0, 0, 0,
        ];
        assert_eq!(texture, expected);
    }

    #[test]
    fn rows_are_copied_top_first() {
        let mut g = glyph('x', 2, 2, 0);
        g.coverage = vec![1, 2, 3, 4];

        let texture = compose_texture((2, 2), &[g], &[AtlasRect::new(0, 0, 2, 2)]);
        assert_eq!(texture, vec![1, 2, 3, 4]);
    }

    #[test]
    fn config_validation() {
        assert!(AtlasConfig::default().validate().is_ok());

        let bad_size = AtlasConfig { font_size: 0.0, ..AtlasConfig::default() };
        assert!(matches!(bad_size.validate(), Err(AtlasError::InvalidConfig(_))));

        let bad_max = AtlasConfig { max_texture_size: 1000, ..AtlasConfig::default() };
        assert!(bad_max.validate().is_err());

        let bad_padding = AtlasConfig { padding: 32, max_texture_size: 64, ..AtlasConfig::default() };
        assert!(bad_padding.validate().is_err());
    }
}
