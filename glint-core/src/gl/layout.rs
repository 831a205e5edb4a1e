//! Vertex layout descriptions.
//!
//! A [`VertexLayout`] describes how the bytes of one vertex map onto shader
//! attribute locations: which scalar type each attribute uses, how many
//! components it has, where it starts inside the vertex and how the shader
//! should see the data (float, normalized, integer). Layouts are plain data
//! and are validated when built; [`VertexLayout::apply`] turns them into
//! `glVertexAttrib*Pointer` calls for the currently bound vertex array.
//!
//! ```
//! use glint_core::gl::{AttributeFormat, ScalarType, VertexLayout};
//!
//! // struct { position: [f32; 3], color: [u8; 4], uv: [u16; 2] }
//! let layout = VertexLayout::builder()
//!     .attribute(0, AttributeFormat::float(3))
//!     .attribute(1, AttributeFormat::normalized(ScalarType::U8, 4))
//!     .attribute(2, AttributeFormat::normalized(ScalarType::U16, 2))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(layout.stride(), 20);
//! assert_eq!(layout.attributes()[2].offset, 16);
//! ```

use glow::HasContext;

use crate::error::Error;

/// Largest stride accepted; the minimum `GL_MAX_VERTEX_ATTRIB_STRIDE`.
pub const MAX_STRIDE: u32 = 2048;

/// Scalar element types of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// `i8`
    I8,
    /// `u8`
    U8,
    /// `i16`
    I16,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// Half-precision float, stored as `u16` bits
    F16,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl ScalarType {
    /// Size of one component in bytes.
    pub const fn size(self) -> u32 {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 | ScalarType::F16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Whether the type is an integer type, signed or not.
    pub const fn is_integer(self) -> bool {
        !matches!(self, ScalarType::F16 | ScalarType::F32 | ScalarType::F64)
    }

    /// The matching GL type enum, e.g. `GL_UNSIGNED_BYTE`.
    pub const fn gl_type(self) -> u32 {
        match self {
            ScalarType::I8 => glow::BYTE,
            ScalarType::U8 => glow::UNSIGNED_BYTE,
            ScalarType::I16 => glow::SHORT,
            ScalarType::U16 => glow::UNSIGNED_SHORT,
            ScalarType::I32 => glow::INT,
            ScalarType::U32 => glow::UNSIGNED_INT,
            ScalarType::F16 => glow::HALF_FLOAT,
            ScalarType::F32 => glow::FLOAT,
            ScalarType::F64 => glow::DOUBLE,
        }
    }
}

/// Formats packing four components into a single 32-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackedFormat {
    /// Signed 10-10-10-2, x in the low bits
    Int2101010Rev,
    /// Unsigned 10-10-10-2, x in the low bits
    UInt2101010Rev,
}

impl PackedFormat {
    /// The matching GL type enum.
    pub const fn gl_type(self) -> u32 {
        match self {
            PackedFormat::Int2101010Rev => glow::INT_2_10_10_10_REV,
            PackedFormat::UInt2101010Rev => glow::UNSIGNED_INT_2_10_10_10_REV,
        }
    }

    /// Packs a vector into the signed 2-10-10-10 format, treating each
    /// component as a normalized value in `[-1, 1]`.
    pub fn pack_snorm(x: f32, y: f32, z: f32, w: f32) -> u32 {
        fn snorm(v: f32, bits: u32) -> u32 {
            let max = ((1 << (bits - 1)) - 1) as f32;
            let mask = (1u32 << bits) - 1;
            ((v.clamp(-1.0, 1.0) * max).round() as i32 as u32) & mask
        }

        snorm(x, 10) | (snorm(y, 10) << 10) | (snorm(z, 10) << 20) | (snorm(w, 2) << 30)
    }

    /// Packs a vector into the unsigned 2-10-10-10 format, treating each
    /// component as a normalized value in `[0, 1]`.
    pub fn pack_unorm(x: f32, y: f32, z: f32, w: f32) -> u32 {
        fn unorm(v: f32, bits: u32) -> u32 {
            let max = ((1u32 << bits) - 1) as f32;
            (v.clamp(0.0, 1.0) * max).round() as u32
        }

        unorm(x, 10) | (unorm(y, 10) << 10) | (unorm(z, 10) << 20) | (unorm(w, 2) << 30)
    }
}

/// How the shader sees an attribute's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Floating-point data read as is
    Float,
    /// Integer data mapped to `[0, 1]` or `[-1, 1]`
    Normalized,
    /// Integer data converted to float without normalization
    Scaled,
    /// Integer data read by `int`/`uint` shader inputs
    Integer,
}

/// Storage of an attribute's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeData {
    /// `components` consecutive scalars
    Scalar(ScalarType),
    /// Four components packed into 32 bits
    Packed(PackedFormat),
}

/// Memory format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeFormat {
    pub data: AttributeData,
    pub components: u8,
    pub kind: AttributeKind,
}

impl AttributeFormat {
    /// `f32` vector with `components` elements.
    pub const fn float(components: u8) -> Self {
        Self::scalar(ScalarType::F32, components, AttributeKind::Float)
    }

    /// `f16` vector with `components` elements.
    pub const fn half(components: u8) -> Self {
        Self::scalar(ScalarType::F16, components, AttributeKind::Float)
    }

    /// `f64` vector; requires `dvec` shader inputs.
    pub const fn double(components: u8) -> Self {
        Self::scalar(ScalarType::F64, components, AttributeKind::Float)
    }

    /// Integer vector normalized to `[0, 1]` (unsigned) or `[-1, 1]` (signed).
    pub const fn normalized(scalar: ScalarType, components: u8) -> Self {
        Self::scalar(scalar, components, AttributeKind::Normalized)
    }

    /// Integer vector converted to float as is.
    pub const fn scaled(scalar: ScalarType, components: u8) -> Self {
        Self::scalar(scalar, components, AttributeKind::Scaled)
    }

    /// Integer vector read by integer shader inputs.
    pub const fn integer(scalar: ScalarType, components: u8) -> Self {
        Self::scalar(scalar, components, AttributeKind::Integer)
    }

    /// Packed 10-10-10-2 vector, normalized or scaled.
    pub const fn packed(format: PackedFormat, normalized: bool) -> Self {
        Self {
            data: AttributeData::Packed(format),
            components: 4,
            kind: if normalized { AttributeKind::Normalized } else { AttributeKind::Scaled },
        }
    }

    /// Any scalar attribute; validity is checked on `build`.
    pub const fn scalar(scalar: ScalarType, components: u8, kind: AttributeKind) -> Self {
        Self { data: AttributeData::Scalar(scalar), components, kind }
    }

    /// Size of the attribute in bytes.
    pub const fn size(&self) -> u32 {
        match self.data {
            AttributeData::Scalar(scalar) => scalar.size() * self.components as u32,
            AttributeData::Packed(_) => 4,
        }
    }

    /// Alignment applied when the attribute is appended to a layout.
    pub const fn alignment(&self) -> u32 {
        match self.data {
            AttributeData::Scalar(scalar) => scalar.size(),
            AttributeData::Packed(_) => 4,
        }
    }

    /// GL type enum of one component, or of the packed word.
    pub const fn gl_type(&self) -> u32 {
        match self.data {
            AttributeData::Scalar(scalar) => scalar.gl_type(),
            AttributeData::Packed(packed) => packed.gl_type(),
        }
    }

    fn validate(&self, location: u32) -> Result<(), LayoutError> {
        if !(1..=4).contains(&self.components) {
            return Err(LayoutError::InvalidComponentCount {
                location,
                components: self.components,
            });
        }

        let compatible = match (self.data, self.kind) {
            (AttributeData::Packed(_), kind) => {
                self.components == 4
                    && matches!(kind, AttributeKind::Normalized | AttributeKind::Scaled)
            },
            (AttributeData::Scalar(scalar), AttributeKind::Float) => !scalar.is_integer(),
            (AttributeData::Scalar(scalar), _) => scalar.is_integer(),
        };

        if compatible {
            Ok(())
        } else {
            Err(LayoutError::IncompatibleKind { location, format: *self })
        }
    }
}

/// A single attribute inside a [`VertexLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader attribute location
    pub location: u32,
    pub format: AttributeFormat,
    /// Byte offset from the start of the vertex
    pub offset: u32,
    /// 0 advances per vertex, n advances every n instances
    pub divisor: u32,
}

impl VertexAttribute {
    /// Byte offset one past the end of the attribute.
    pub const fn end(&self) -> u32 {
        self.offset.saturating_add(self.format.size())
    }
}

/// Invalid vertex layout descriptions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("vertex layout has no attributes")]
    Empty,
    #[error("attribute {location}: {components} components, expected 1 to 4")]
    InvalidComponentCount { location: u32, components: u8 },
    #[error("attribute {location}: {format:?} is not a valid combination")]
    IncompatibleKind { location: u32, format: AttributeFormat },
    #[error("attribute location {0} is used more than once")]
    DuplicateLocation(u32),
    #[error("attribute {location} ends at byte {end}, past the vertex stride {stride}")]
    OutOfBounds { location: u32, end: u32, stride: u32 },
    #[error("attributes {first} and {second} overlap")]
    Overlap { first: u32, second: u32 },
    #[error("stride {0} exceeds the maximum of 2048 bytes")]
    StrideTooLarge(u32),
    #[error("matrix attribute {location}: {cols}x{rows} is not between 2x2 and 4x4")]
    InvalidMatrix { location: u32, cols: u8, rows: u8 },
    #[error("attribute location {location} exceeds the driver limit of {max} attributes")]
    LocationOutOfRange { location: u32, max: u32 },
    #[error("shader attribute '{name}' at location {location} is not fed by any vertex buffer")]
    MissingAttribute { name: String, location: u32 },
}

/// Describes the memory layout of one vertex and how it feeds shader
/// attribute locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: u32,
}

impl VertexLayout {
    /// Starts an empty layout description.
    pub fn builder() -> VertexLayoutBuilder {
        VertexLayoutBuilder::default()
    }

    /// The attributes in declaration order.
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Distance in bytes between consecutive vertices.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Attribute locations fed by this layout.
    pub fn locations(&self) -> impl Iterator<Item = u32> + '_ {
        self.attributes.iter().map(|a| a.location)
    }

    /// Points the attribute locations at the buffer currently bound to
    /// `GL_ARRAY_BUFFER`, starting `base_offset` bytes into it.
    ///
    /// Must be called with the target vertex array bound; attribute state is
    /// stored in the vertex array object.
    pub fn apply(&self, gl: &glow::Context, base_offset: u32) -> Result<(), Error> {
        let max = unsafe { gl.get_parameter_i32(glow::MAX_VERTEX_ATTRIBS) }.max(0) as u32;
        if let Some(attr) = self.attributes.iter().find(|a| a.location >= max) {
            return Err(LayoutError::LocationOutOfRange { location: attr.location, max }.into());
        }

        let stride = self.stride as i32;
        for attr in &self.attributes {
            let offset = (base_offset + attr.offset) as i32;
            let size = attr.format.components as i32;
            let data_type = attr.format.gl_type();

            unsafe {
                gl.enable_vertex_attrib_array(attr.location);
                match (attr.format.data, attr.format.kind) {
                    (AttributeData::Scalar(ScalarType::F64), _) => {
                        gl.vertex_attrib_pointer_f64(attr.location, size, data_type, stride, offset);
                    },
                    (_, AttributeKind::Integer) => {
                        gl.vertex_attrib_pointer_i32(attr.location, size, data_type, stride, offset);
                    },
                    (_, kind) => {
                        let normalized = kind == AttributeKind::Normalized;
                        gl.vertex_attrib_pointer_f32(
                            attr.location,
                            size,
                            data_type,
                            normalized,
                            stride,
                            offset,
                        );
                    },
                }
                gl.vertex_attrib_divisor(attr.location, attr.divisor);
            }
        }

        Ok(())
    }
}

/// Incrementally describes a [`VertexLayout`].
///
/// Attributes appended with [`attribute`](Self::attribute) follow `#[repr(C)]`
/// placement: the cursor is aligned to the attribute's scalar size first, and
/// the default stride is the cursor rounded up to the largest alignment seen.
/// Explicit offsets, padding and strides describe layouts that do not follow
/// those rules.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct VertexLayoutBuilder {
    attributes: Vec<VertexAttribute>,
    cursor: u32,
    max_alignment: u32,
    stride: Option<u32>,
    divisor: u32,
    error: Option<LayoutError>,
}

impl VertexLayoutBuilder {
    /// Appends an attribute after the previous one, honoring alignment.
    pub fn attribute(mut self, location: u32, format: AttributeFormat) -> Self {
        match align_up(self.cursor, format.alignment()) {
            Some(offset) => self.attribute_at(location, format, offset),
            None => {
                self.error.get_or_insert(LayoutError::StrideTooLarge(u32::MAX));
                self
            },
        }
    }

    /// Places an attribute at an explicit byte offset; the cursor moves to
    /// its end.
    pub fn attribute_at(mut self, location: u32, format: AttributeFormat, offset: u32) -> Self {
        let Some(end) = offset.checked_add(format.size()) else {
            self.error.get_or_insert(LayoutError::OutOfBounds {
                location,
                end: u32::MAX,
                stride: MAX_STRIDE,
            });
            return self;
        };

        self.attributes.push(VertexAttribute {
            location,
            format,
            offset,
            divisor: self.divisor,
        });
        self.cursor = end;
        self.max_alignment = self.max_alignment.max(format.alignment());
        self
    }

    /// Skips `bytes` bytes of unused space.
    pub fn padding(mut self, bytes: u32) -> Self {
        match self.cursor.checked_add(bytes) {
            Some(cursor) => self.cursor = cursor,
            None => {
                self.error.get_or_insert(LayoutError::StrideTooLarge(u32::MAX));
            },
        }
        self
    }

    /// Appends a float matrix as one `rows`-component attribute per column,
    /// at consecutive locations starting with `location`.
    pub fn matrix(mut self, location: u32, cols: u8, rows: u8) -> Self {
        if !(2..=4).contains(&cols) || !(2..=4).contains(&rows) {
            self.error.get_or_insert(LayoutError::InvalidMatrix { location, cols, rows });
            return self;
        }

        (0..cols as u32).fold(self, |builder, col| {
            builder.attribute(location + col, AttributeFormat::float(rows))
        })
    }

    /// Sets the instancing divisor for attributes added after this call.
    pub fn divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    /// Forces the vertex stride instead of deriving it from the attributes.
    pub fn stride(mut self, stride: u32) -> Self {
        self.stride = Some(stride);
        self
    }

    /// Validates the description.
    pub fn build(self) -> Result<VertexLayout, LayoutError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        if self.attributes.is_empty() {
            return Err(LayoutError::Empty);
        }

        for attr in &self.attributes {
            attr.format.validate(attr.location)?;
        }

        let mut locations: Vec<u32> = self.attributes.iter().map(|a| a.location).collect();
        locations.sort_unstable();
        if let Some(pair) = locations.windows(2).find(|w| w[0] == w[1]) {
            return Err(LayoutError::DuplicateLocation(pair[0]));
        }

        let stride = match self.stride {
            Some(stride) => stride,
            None => align_up(self.cursor, self.max_alignment.max(1))
                .ok_or(LayoutError::StrideTooLarge(u32::MAX))?,
        };
        if stride > MAX_STRIDE {
            return Err(LayoutError::StrideTooLarge(stride));
        }

        if let Some(attr) = self.attributes.iter().find(|a| a.end() > stride) {
            return Err(LayoutError::OutOfBounds {
                location: attr.location,
                end: attr.end(),
                stride,
            });
        }

        let mut by_offset: Vec<&VertexAttribute> = self.attributes.iter().collect();
        by_offset.sort_by_key(|a| a.offset);
        if let Some(pair) = by_offset.windows(2).find(|w| w[0].end() > w[1].offset) {
            return Err(LayoutError::Overlap {
                first: pair[0].location,
                second: pair[1].location,
            });
        }

        Ok(VertexLayout { attributes: self.attributes, stride })
    }
}

/// Types with a fixed vertex layout, usually `#[repr(C)]` structs.
///
/// ```
/// use glint_core::gl::{AttributeFormat, LayoutError, ScalarType, Vertex, VertexLayout};
/// use std::mem::offset_of;
///
/// #[repr(C)]
/// #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
/// struct ColoredVertex {
///     position: [f32; 2],
///     color: [u8; 4],
/// }
///
/// impl Vertex for ColoredVertex {
///     fn layout() -> Result<VertexLayout, LayoutError> {
///         VertexLayout::builder()
///             .attribute_at(0, AttributeFormat::float(2), offset_of!(Self, position) as u32)
///             .attribute_at(1, AttributeFormat::normalized(ScalarType::U8, 4), offset_of!(Self, color) as u32)
///             .stride(size_of::<Self>() as u32)
///             .build()
///     }
/// }
///
/// assert_eq!(ColoredVertex::layout().unwrap().stride(), 12);
/// ```
pub trait Vertex: bytemuck::Pod {
    fn layout() -> Result<VertexLayout, LayoutError>;
}

const fn align_up(value: u32, alignment: u32) -> Option<u32> {
    value.div_ceil(alignment).checked_mul(alignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_attributes_follow_repr_c() {
        // struct { pos: [f32; 3], color: [u8; 3], normal: [i16; 3] }
        let layout = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(3))
            .attribute(1, AttributeFormat::normalized(ScalarType::U8, 3))
            .attribute(2, AttributeFormat::normalized(ScalarType::I16, 3))
            .build()
            .unwrap();

        let offsets: Vec<u32> = layout.attributes().iter().map(|a| a.offset).collect();
        // color ends at 15, normal aligned to 16, ends at 22, stride rounded to 24
        assert_eq!(offsets, vec![0, 12, 16]);
        assert_eq!(layout.stride(), 24);
    }

    #[test]
    fn padding_and_explicit_stride() {
        let layout = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(2))
            .padding(8)
            .attribute(1, AttributeFormat::float(1))
            .stride(32)
            .build()
            .unwrap();

        assert_eq!(layout.attributes()[1].offset, 16);
        assert_eq!(layout.stride(), 32);
    }

    #[test]
    fn tightly_packed_unaligned_layout() {
        // 3 bytes of color followed by an unaligned float at offset 3
        let layout = VertexLayout::builder()
            .attribute_at(0, AttributeFormat::normalized(ScalarType::U8, 3), 0)
            .attribute_at(1, AttributeFormat::float(1), 3)
            .stride(7)
            .build()
            .unwrap();

        assert_eq!(layout.stride(), 7);
        assert_eq!(layout.attributes()[1].end(), 7);
    }

    #[test]
    fn packed_normals_occupy_four_bytes() {
        let layout = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(3))
            .attribute(1, AttributeFormat::packed(PackedFormat::Int2101010Rev, true))
            .build()
            .unwrap();

        assert_eq!(layout.attributes()[1].offset, 12);
        assert_eq!(layout.attributes()[1].format.gl_type(), glow::INT_2_10_10_10_REV);
        assert_eq!(layout.stride(), 16);
    }

    #[test]
    fn matrix_expands_into_columns() {
        let layout = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(2))
            .divisor(1)
            .matrix(2, 4, 4)
            .build()
            .unwrap();

        let attrs = layout.attributes();
        assert_eq!(attrs.len(), 5);
        assert_eq!(attrs[0].divisor, 0);
        assert_eq!(
            attrs[1..].iter().map(|a| (a.location, a.offset, a.divisor)).collect::<Vec<_>>(),
            vec![(2, 8, 1), (3, 24, 1), (4, 40, 1), (5, 56, 1)]
        );
        assert_eq!(layout.stride(), 72);
    }

    #[test]
    fn invalid_matrix_is_reported() {
        let err = VertexLayout::builder()
            .matrix(0, 5, 4)
            .attribute(6, AttributeFormat::float(1))
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::InvalidMatrix { location: 0, cols: 5, rows: 4 });
    }

    #[test]
    fn rejects_empty_layout() {
        assert_eq!(VertexLayout::builder().build(), Err(LayoutError::Empty));
    }

    #[test]
    fn rejects_bad_component_counts() {
        let err = VertexLayout::builder()
            .attribute(3, AttributeFormat::float(5))
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::InvalidComponentCount { location: 3, components: 5 });

        let err = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidComponentCount { .. }));
    }

    #[test]
    fn rejects_incompatible_kinds() {
        let cases = [
            AttributeFormat::scalar(ScalarType::F32, 2, AttributeKind::Integer),
            AttributeFormat::scalar(ScalarType::F32, 2, AttributeKind::Normalized),
            AttributeFormat::scalar(ScalarType::F64, 2, AttributeKind::Scaled),
            AttributeFormat::scalar(ScalarType::U8, 4, AttributeKind::Float),
            AttributeFormat {
                data: AttributeData::Packed(PackedFormat::UInt2101010Rev),
                components: 4,
                kind: AttributeKind::Integer,
            },
            AttributeFormat {
                data: AttributeData::Packed(PackedFormat::UInt2101010Rev),
                components: 3,
                kind: AttributeKind::Normalized,
            },
        ];

        for format in cases {
            let err = VertexLayout::builder()
                .attribute(0, format)
                .build()
                .unwrap_err();
            assert_eq!(err, LayoutError::IncompatibleKind { location: 0, format }, "{format:?}");
        }
    }

    #[test]
    fn accepts_valid_kinds() {
        let layout = VertexLayout::builder()
            .attribute(0, AttributeFormat::double(2))
            .attribute(1, AttributeFormat::half(2))
            .attribute(2, AttributeFormat::integer(ScalarType::U32, 1))
            .attribute(3, AttributeFormat::scaled(ScalarType::I16, 2))
            .attribute(4, AttributeFormat::packed(PackedFormat::UInt2101010Rev, false))
            .build();
        assert!(layout.is_ok(), "{layout:?}");
    }

    #[test]
    fn rejects_duplicate_locations() {
        let err = VertexLayout::builder()
            .attribute(1, AttributeFormat::float(2))
            .attribute(1, AttributeFormat::float(2))
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateLocation(1));
    }

    #[test]
    fn rejects_attributes_past_the_stride() {
        let err = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(4))
            .stride(12)
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::OutOfBounds { location: 0, end: 16, stride: 12 });
    }

    #[test]
    fn rejects_overlapping_attributes() {
        let err = VertexLayout::builder()
            .attribute_at(0, AttributeFormat::float(2), 0)
            .attribute_at(1, AttributeFormat::float(2), 4)
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::Overlap { first: 0, second: 1 });
    }

    #[test]
    fn rejects_huge_strides() {
        let err = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(1))
            .stride(4096)
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::StrideTooLarge(4096));
    }

    #[test]
    fn snorm_packing() {
        assert_eq!(PackedFormat::pack_snorm(0.0, 0.0, 0.0, 0.0), 0);
        assert_eq!(PackedFormat::pack_snorm(1.0, 0.0, 0.0, 0.0), 511);
        // -1.0 in 10 bits two's complement is 0x201
        assert_eq!(PackedFormat::pack_snorm(0.0, -1.0, 0.0, 0.0), 0x201 << 10);
        assert_eq!(PackedFormat::pack_snorm(0.0, 0.0, 0.0, 1.0), 1 << 30);
    }

    #[test]
    fn unorm_packing() {
        assert_eq!(PackedFormat::pack_unorm(1.0, 0.0, 0.0, 0.0), 1023);
        assert_eq!(PackedFormat::pack_unorm(0.0, 0.0, 1.0, 1.0), (1023 << 20) | (3 << 30));
        assert_eq!(PackedFormat::pack_unorm(2.0, -1.0, 0.0, 0.0), 1023, "values are clamped");
    }

    #[test]
    fn align_up_rounds_to_multiples() {
        assert_eq!(align_up(0, 4), Some(0));
        assert_eq!(align_up(13, 4), Some(16));
        assert_eq!(align_up(16, 8), Some(16));
        assert_eq!(align_up(3, 1), Some(3));
        assert_eq!(align_up(u32::MAX, 4), None);
    }

    #[test]
    fn offsets_near_u32_max_are_rejected() {
        let err = VertexLayout::builder()
            .attribute_at(0, AttributeFormat::float(4), u32::MAX - 3)
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::OutOfBounds { location: 0, end: u32::MAX, stride: MAX_STRIDE });

        let err = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(1))
            .padding(u32::MAX)
            .attribute(1, AttributeFormat::float(1))
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::StrideTooLarge(u32::MAX));

        let err = VertexLayout::builder()
            .attribute(0, AttributeFormat::normalized(ScalarType::U8, 1))
            .padding(u32::MAX - 2)
            .attribute(1, AttributeFormat::float(1))
            .build()
            .unwrap_err();
        assert_eq!(err, LayoutError::StrideTooLarge(u32::MAX));
    }
}
