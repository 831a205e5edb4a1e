//! Font atlas generation: rasterizes a font with `fontdue`, packs the glyph
//! bitmaps with a skyline packer and extracts kerning into
//! [`FontAtlasData`](glint_data::FontAtlasData).
//!
//! ```no_run
//! use glint_atlas::{AtlasConfig, AtlasGenerator, Charset, FontSource};
//!
//! let font = FontSource::parse("monospace").load()?;
//! let generator = AtlasGenerator::new(&font, AtlasConfig::default())?;
//! let (atlas, report) = generator.generate(&Charset::ascii())?;
//! println!("{} glyphs in a {:?} texture", report.glyph_count, atlas.texture_size);
//! # Ok::<(), glint_atlas::AtlasError>(())
//! ```

use std::path::PathBuf;

pub mod atlas_generator;
pub mod charset;
pub mod font_source;
pub mod glyph_rasterizer;
pub mod kerning;
pub mod packer;

pub use atlas_generator::{AtlasConfig, AtlasGenerator, GenerationReport};
pub use charset::Charset;
pub use font_source::{FontData, FontSource, list_families};
pub use packer::{AtlasBuilder, PackError, SkylinePacker};

/// Errors raised while generating a font atlas.
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("no installed font matches '{0}'")]
    FontNotFound(String),

    #[error("failed to read font file {}", path.display())]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    FontParse(String),

    #[error("invalid atlas configuration: {0}")]
    InvalidConfig(String),

    #[error("the font has none of the requested glyphs")]
    NoGlyphs,

    #[error(transparent)]
    Pack(#[from] PackError),
}
