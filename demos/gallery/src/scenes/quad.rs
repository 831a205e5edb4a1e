use std::mem::offset_of;

use bytemuck::{Pod, Zeroable};
use glint_core::{
    AttributeFormat, Buffer, BufferTarget, BufferUsage, Error, PrimitiveMode, ShaderProgram,
    Vertex, VertexArray, VertexLayout, gl::LayoutError,
};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

impl Vertex for QuadVertex {
    fn layout() -> Result<VertexLayout, LayoutError> {
        VertexLayout::builder()
            .attribute_at(0, AttributeFormat::float(2), offset_of!(Self, position) as u32)
            .attribute_at(1, AttributeFormat::float(2), offset_of!(Self, uv) as u32)
            .stride(size_of::<Self>() as u32)
            .build()
    }
}

/// A clip-space quad covering the viewport, drawn as a triangle strip.
#[derive(Debug)]
pub(crate) struct TexturedQuad {
    vertices: Buffer<QuadVertex>,
    vao: VertexArray,
}

impl TexturedQuad {
    /// `flip_v` maps texture row 0 to the top of the screen.
    pub(crate) fn new(
        gl: &glow::Context,
        program: &ShaderProgram,
        flip_v: bool,
    ) -> Result<Self, Error> {
        let (top, bottom) = if flip_v { (0.0, 1.0) } else { (1.0, 0.0) };
        let vertices = [
            QuadVertex { position: [-1.0, -1.0], uv: [0.0, bottom] },
            QuadVertex { position: [1.0, -1.0], uv: [1.0, bottom] },
            QuadVertex { position: [-1.0, 1.0], uv: [0.0, top] },
            QuadVertex { position: [1.0, 1.0], uv: [1.0, top] },
        ];

        let layout = QuadVertex::layout()?;
        program.check_layouts(&[&layout])?;

        let vertices = Buffer::with_data(gl, BufferTarget::Array, BufferUsage::Static, &vertices)?;
        let mut vao = VertexArray::new(gl)?;
        vao.attach(gl, &vertices, &layout)?;

        Ok(Self { vertices, vao })
    }

    /// Verifies that `program` reads only the quad's attributes.
    pub(crate) fn check_program(&self, program: &ShaderProgram) -> Result<(), LayoutError> {
        let layouts: Vec<&VertexLayout> = self.vao.layouts().collect();
        program.check_layouts(&layouts)
    }

    pub(crate) fn draw(&self, gl: &glow::Context) {
        self.vao.draw(gl, PrimitiveMode::TriangleStrip, 0, Some(4));
    }

    pub(crate) fn delete(self, gl: &glow::Context) {
        self.vao.delete(gl);
        self.vertices.delete(gl);
    }
}
