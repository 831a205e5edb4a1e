mod atlas;
mod glyph;
pub(crate) mod serialization;

pub use atlas::{FontAtlasData, LineMetrics};
pub use glyph::{AtlasRect, GlyphEntry, KerningPair};
pub use serialization::SerializationError;
use serialization::*;

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct FontAtlasDeserializationError {
    pub message: String,
}
