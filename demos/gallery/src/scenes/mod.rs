pub mod cube;
pub mod fractal;
pub mod life;
mod quad;
pub mod text;
pub mod triangle;

use glint_core::{GlslVersion, ShaderProgram};

pub(crate) use quad::TexturedQuad;

const GLSL: GlslVersion = GlslVersion::Gl330;

fn program(gl: &glow::Context, vertex: &str, fragment: &str) -> Result<ShaderProgram, glint_core::Error> {
    ShaderProgram::from_sources(gl, GLSL, vertex, fragment)
}
