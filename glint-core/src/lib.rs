//! A thin object layer over OpenGL 3.3 / ES 3.0, built on `glow`.
//!
//! GL objects are plain owned values with explicit `delete` methods; no
//! object keeps a reference to the context. Redundant state changes are
//! filtered through [`GlState`].

pub mod error;
pub mod gl;
mod mat4;
pub mod text;

pub use ::glint_data::{FontAtlasData, GlyphEntry, LineMetrics};
pub use error::Error;
pub use gl::{
    AttributeFormat, Buffer, BufferTarget, BufferUsage, Drawable, Framebuffer, GlState,
    PrimitiveMode, RenderContext, ShaderProgram, Texture2D, TextureFormat, Vertex, VertexArray,
    VertexLayout,
};
pub use mat4::{Mat4, Vec3};
pub use text::{FontTexture, TextLayout, TextMesh, TextVertex};

/// GL shader language target for version injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlslVersion {
    /// WebGL2 / OpenGL ES 3.0: `#version 300 es`
    Es300,
    /// OpenGL 3.3 Core: `#version 330 core`
    #[default]
    Gl330,
}

impl GlslVersion {
    pub fn vertex_preamble(&self) -> &'static str {
        match self {
            Self::Es300 => "#version 300 es\nprecision highp float;\n",
            Self::Gl330 => "#version 330 core\n",
        }
    }

    pub fn fragment_preamble(&self) -> &'static str {
        match self {
            Self::Es300 => "#version 300 es\nprecision mediump float;\n",
            Self::Gl330 => "#version 330 core\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preambles_start_with_version() {
        for version in [GlslVersion::Es300, GlslVersion::Gl330] {
            assert!(version.vertex_preamble().starts_with("#version "));
            assert!(version.fragment_preamble().ends_with('\n'));
        }
    }

    #[test]
    fn es_preambles_declare_float_precision() {
        assert!(GlslVersion::Es300.fragment_preamble().contains("precision mediump float;"));
        assert!(!GlslVersion::Gl330.vertex_preamble().contains("precision"));
    }
}
