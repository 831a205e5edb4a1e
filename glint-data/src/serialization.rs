use compact_str::CompactString;
use miniz_oxide::{deflate::compress_to_vec_zlib, inflate::decompress_to_vec_zlib};

use crate::{AtlasRect, FontAtlasData, GlyphEntry, KerningPair, LineMetrics};

const MAGIC: &[u8; 4] = b"GLNT";
const FORMAT_VERSION: u8 = 1;
const COMPRESSION_LEVEL: u8 = 9;

/// Errors raised while decoding a serialized font atlas.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    #[error("invalid header: expected 'GLNT' magic")]
    InvalidMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("failed to decompress atlas payload: {0}")]
    Decompression(String),
    #[error("unexpected end of data reading {field}")]
    UnexpectedEof { field: &'static str },
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },
    #[error("invalid character code point {0:#x}")]
    InvalidChar(u32),
    #[error("texture data holds {actual} bytes, expected {expected}")]
    TextureSizeMismatch { expected: usize, actual: usize },
}

pub(crate) trait Serializable: Sized {
    fn serialize(&self) -> Vec<u8>;
    fn deserialize(deser: &mut Deserializer) -> Result<Self, SerializationError>;
}

#[derive(Default)]
pub(crate) struct Serializer {
    data: Vec<u8>,
}

impl Serializer {
    fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn write_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn write_f32(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    fn write_char(&mut self, value: char) {
        self.write_u32(value as u32);
    }

    /// Writes a string prefixed by its u8 length; longer strings are truncated
    /// at the last char boundary that fits.
    fn write_str(&mut self, value: &str) {
        let mut end = value.len().min(u8::MAX as usize);
        while !value.is_char_boundary(end) {
            end -= 1;
        }

        self.write_u8(end as u8);
        self.data.extend_from_slice(&value.as_bytes()[..end]);
    }

    fn write_bytes(&mut self, value: &[u8]) {
        self.write_u32(value.len() as u32);
        self.data.extend_from_slice(value);
    }

    fn write_rect(&mut self, rect: &AtlasRect) {
        self.write_u32(rect.x);
        self.write_u32(rect.y);
        self.write_u32(rect.width);
        self.write_u32(rect.height);
    }

    /// Compresses the payload and prepends the container header.
    fn into_container(self) -> Vec<u8> {
        let compressed = compress_to_vec_zlib(&self.data, COMPRESSION_LEVEL);

        let mut out = Vec::with_capacity(compressed.len() + MAGIC.len() + 1);
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&compressed);
        out
    }
}

pub(crate) struct Deserializer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Deserializer<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Validates the container header and returns the decompressed payload.
    pub(crate) fn unwrap_container(serialized: &[u8]) -> Result<Vec<u8>, SerializationError> {
        let header_len = MAGIC.len() + 1;
        if serialized.len() < header_len || &serialized[..MAGIC.len()] != MAGIC {
            return Err(SerializationError::InvalidMagic);
        }

        let version = serialized[MAGIC.len()];
        if version != FORMAT_VERSION {
            return Err(SerializationError::UnsupportedVersion(version));
        }

        decompress_to_vec_zlib(&serialized[header_len..])
            .map_err(|e| SerializationError::Decompression(format!("{:?}", e.status)))
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], SerializationError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(SerializationError::UnexpectedEof { field })?;

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn read_u8(&mut self, field: &'static str) -> Result<u8, SerializationError> {
        Ok(self.take(1, field)?[0])
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32, SerializationError> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32, SerializationError> {
        Ok(self.read_u32(field)? as i32)
    }

    fn read_f32(&mut self, field: &'static str) -> Result<f32, SerializationError> {
        Ok(f32::from_bits(self.read_u32(field)?))
    }

    fn read_char(&mut self, field: &'static str) -> Result<char, SerializationError> {
        let code = self.read_u32(field)?;
        char::from_u32(code).ok_or(SerializationError::InvalidChar(code))
    }

    fn read_str(&mut self, field: &'static str) -> Result<CompactString, SerializationError> {
        let len = self.read_u8(field)? as usize;
        let bytes = self.take(len, field)?;
        std::str::from_utf8(bytes)
            .map(CompactString::from)
            .map_err(|_| SerializationError::InvalidUtf8 { field })
    }

    fn read_bytes(&mut self, field: &'static str) -> Result<Vec<u8>, SerializationError> {
        let len = self.read_u32(field)? as usize;
        Ok(self.take(len, field)?.to_vec())
    }

    fn read_rect(&mut self) -> Result<AtlasRect, SerializationError> {
        Ok(AtlasRect {
            x: self.read_u32("rect.x")?,
            y: self.read_u32("rect.y")?,
            width: self.read_u32("rect.width")?,
            height: self.read_u32("rect.height")?,
        })
    }
}

impl Serializable for FontAtlasData {
    fn serialize(&self) -> Vec<u8> {
        let mut ser = Serializer::default();

        ser.write_str(&self.font_name);
        ser.write_f32(self.font_size);

        ser.write_f32(self.line_metrics.ascent);
        ser.write_f32(self.line_metrics.descent);
        ser.write_f32(self.line_metrics.line_gap);

        ser.write_u32(self.texture_size.0);
        ser.write_u32(self.texture_size.1);

        ser.write_u32(self.glyphs.len() as u32);
        for glyph in &self.glyphs {
            ser.write_char(glyph.symbol);
            ser.write_rect(&glyph.rect);
            ser.write_i32(glyph.bearing.0);
            ser.write_i32(glyph.bearing.1);
            ser.write_f32(glyph.advance);
        }

        ser.write_u32(self.kerning.len() as u32);
        for pair in &self.kerning {
            ser.write_char(pair.left);
            ser.write_char(pair.right);
            ser.write_f32(pair.adjust);
        }

        ser.write_bytes(&self.texture_data);

        ser.into_container()
    }

    fn deserialize(deser: &mut Deserializer) -> Result<Self, SerializationError> {
        let font_name = deser.read_str("font_name")?;
        let font_size = deser.read_f32("font_size")?;

        let line_metrics = LineMetrics {
            ascent: deser.read_f32("ascent")?,
            descent: deser.read_f32("descent")?,
            line_gap: deser.read_f32("line_gap")?,
        };

        let texture_size = (deser.read_u32("texture_width")?, deser.read_u32("texture_height")?);

        let glyph_count = deser.read_u32("glyph_count")? as usize;
        let mut glyphs = Vec::with_capacity(glyph_count.min(u16::MAX as usize));
        for _ in 0..glyph_count {
            glyphs.push(GlyphEntry {
                symbol: deser.read_char("glyph.symbol")?,
                rect: deser.read_rect()?,
                bearing: (deser.read_i32("glyph.xmin")?, deser.read_i32("glyph.ymin")?),
                advance: deser.read_f32("glyph.advance")?,
            });
        }

        let kerning_count = deser.read_u32("kerning_count")? as usize;
        let mut kerning = Vec::with_capacity(kerning_count.min(u16::MAX as usize));
        for _ in 0..kerning_count {
            kerning.push(KerningPair {
                left: deser.read_char("kerning.left")?,
                right: deser.read_char("kerning.right")?,
                adjust: deser.read_f32("kerning.adjust")?,
            });
        }

        let texture_data = deser.read_bytes("texture_data")?;
        let expected = texture_size.0 as usize * texture_size.1 as usize;
        if texture_data.len() != expected {
            return Err(SerializationError::TextureSizeMismatch {
                expected,
                actual: texture_data.len(),
            });
        }

        Ok(FontAtlasData::new(
            font_name,
            font_size,
            line_metrics,
            texture_size,
            glyphs,
            kerning,
            texture_data,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_atlas() -> FontAtlasData {
        let glyphs = vec![
            GlyphEntry {
                symbol: 'A',
                rect: AtlasRect::new(1, 1, 3, 4),
                bearing: (0, 0),
                advance: 4.5,
            },
            GlyphEntry {
                symbol: 'g',
                rect: AtlasRect::new(5, 1, 3, 5),
                bearing: (1, -2),
                advance: 4.0,
            },
            GlyphEntry {
                symbol: ' ',
                rect: AtlasRect::EMPTY,
                bearing: (0, 0),
                advance: 3.0,
            },
        ];

        let kerning = vec![KerningPair { left: 'A', right: 'g', adjust: -0.75 }];

        let texture_data = (0..16u32 * 8).map(|i| (i % 251) as u8).collect();

        FontAtlasData::new(
            "Test Mono",
            12.0,
            LineMetrics::new(9.5, -2.5, 1.0),
            (16, 8),
            glyphs,
            kerning,
            texture_data,
        )
    }

    #[test]
    fn test_atlas_roundtrip() {
        let original = create_test_atlas();
        let serialized = original.to_binary();
        let restored = FontAtlasData::from_binary(&serialized).unwrap();

        assert_eq!(original, restored);
        assert_eq!(restored.glyph('g').unwrap().bearing, (1, -2));
        assert_eq!(restored.kerning('A', 'g'), -0.75);
    }

    #[test]
    fn test_container_header() {
        let serialized = create_test_atlas().to_binary();
        assert_eq!(&serialized[..4], b"GLNT");
        assert_eq!(serialized[4], FORMAT_VERSION);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut serialized = create_test_atlas().to_binary();
        serialized[0] = b'X';

        assert_eq!(
            Deserializer::unwrap_container(&serialized),
            Err(SerializationError::InvalidMagic)
        );
        assert!(FontAtlasData::from_binary(&serialized).is_err());
        assert!(FontAtlasData::from_binary(b"GL").is_err());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut serialized = create_test_atlas().to_binary();
        serialized[4] = 42;

        assert_eq!(
            Deserializer::unwrap_container(&serialized),
            Err(SerializationError::UnsupportedVersion(42))
        );
    }

    #[test]
    fn test_rejects_corrupted_payload() {
        let mut serialized = create_test_atlas().to_binary();
        serialized.truncate(serialized.len() / 2);

        let err = FontAtlasData::from_binary(&serialized).unwrap_err();
        assert!(err.message.contains("decompress"), "{}", err.message);
    }

    #[test]
    fn test_truncated_payload_reports_field() {
        let mut ser = Serializer::default();
        ser.write_str("Truncated");
        ser.write_f32(12.0);
        let serialized = ser.into_container();

        let err = FontAtlasData::from_binary(&serialized).unwrap_err();
        assert!(err.message.contains("ascent"), "{}", err.message);
    }

    #[test]
    fn test_texture_length_is_validated() {
        let mut atlas = create_test_atlas();
        atlas.texture_data.pop();

        let err = FontAtlasData::from_binary(&atlas.to_binary()).unwrap_err();
        assert!(err.message.contains("expected 128"), "{}", err.message);
    }

    #[test]
    fn test_long_names_are_truncated_on_char_boundary() {
        let mut ser = Serializer::default();
        let name = "é".repeat(200); // 400 bytes
        ser.write_str(&name);

        let mut deser = Deserializer::new(&ser.data);
        let restored = deser.read_str("name").unwrap();
        assert_eq!(restored.len(), 254);
        assert!(restored.chars().all(|c| c == 'é'));
    }
}
