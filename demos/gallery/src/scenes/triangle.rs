use bytemuck::{Pod, Zeroable};
use glint_core::{
    AttributeFormat, Buffer, BufferTarget, BufferUsage, Drawable, Error, GlState, PrimitiveMode,
    RenderContext, ShaderProgram, Vertex, VertexArray, VertexLayout,
    gl::{ClearFlags, LayoutError, ScalarType, render},
};

use crate::scene::Scene;

const VERTEX_SHADER: &str = include_str!("../shaders/triangle.vert");
const FRAGMENT_SHADER: &str = include_str!("../shaders/triangle.frag");

/// Position followed by an RGBA8 color and four unused bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ColorVertex {
    position: [f32; 2],
    color: [u8; 4],
    _reserved: [u8; 4],
}

impl ColorVertex {
    const fn new(x: f32, y: f32, color: [u8; 4]) -> Self {
        Self { position: [x, y], color, _reserved: [0; 4] }
    }
}

impl Vertex for ColorVertex {
    fn layout() -> Result<VertexLayout, LayoutError> {
        VertexLayout::builder()
            .attribute(0, AttributeFormat::float(2))
            .attribute(1, AttributeFormat::normalized(ScalarType::U8, 4))
            .padding(4)
            .build()
    }
}

const VERTICES: [ColorVertex; 3] = [
    ColorVertex::new(0.0, 0.6, [255, 85, 85, 255]),
    ColorVertex::new(-0.52, -0.3, [80, 250, 123, 255]),
    ColorVertex::new(0.52, -0.3, [139, 233, 253, 255]),
];

struct TriangleMesh {
    program: ShaderProgram,
    vertices: Buffer<ColorVertex>,
    vao: VertexArray,
    angle: f32,
    aspect: f32,
}

impl Drawable for TriangleMesh {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        self.program.bind(context.gl, context.state);
        self.program.set_uniform(context.gl, "u_angle", &self.angle)?;
        self.program.set_uniform(context.gl, "u_aspect", &self.aspect)
    }

    fn draw(&self, context: &mut RenderContext) {
        self.vao.draw(context.gl, PrimitiveMode::Triangles, 0, Some(self.vertices.len()));
    }
}

/// A spinning triangle with per-vertex colors.
pub struct TriangleScene {
    mesh: TriangleMesh,
    size: (i32, i32),
}

impl TriangleScene {
    pub fn new(gl: &glow::Context, size: (i32, i32)) -> Result<Self, Error> {
        let program = super::program(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;

        let layout = ColorVertex::layout()?;
        program.check_layouts(&[&layout])?;

        let vertices = Buffer::with_data(gl, BufferTarget::Array, BufferUsage::Static, &VERTICES)?;
        let mut vao = VertexArray::new(gl)?;
        vao.attach(gl, &vertices, &layout)?;

        let mesh = TriangleMesh {
            program,
            vertices,
            vao,
            angle: 0.0,
            aspect: aspect(size),
        };
        Ok(Self { mesh, size })
    }
}

impl Scene for TriangleScene {
    fn update(&mut self, dt: f32) {
        self.mesh.angle = (self.mesh.angle + dt * 0.8) % std::f32::consts::TAU;
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<(), Error> {
        ctx.state
            .viewport(ctx.gl, 0, 0, self.size.0, self.size.1)
            .clear_color(ctx.gl, 0.16, 0.16, 0.21, 1.0)
            .clear(ctx.gl, ClearFlags::COLOR);

        render(ctx, &[&self.mesh])
    }

    fn resize(&mut self, _gl: &glow::Context, _state: &mut GlState, size: (i32, i32)) -> Result<(), Error> {
        self.size = size;
        self.mesh.aspect = aspect(size);
        Ok(())
    }

    fn delete(self: Box<Self>, gl: &glow::Context, state: &mut GlState) {
        let mesh = self.mesh;
        mesh.vao.delete(gl);
        mesh.vertices.delete(gl);
        mesh.program.delete(gl, state);
    }
}

pub(crate) fn aspect((width, height): (i32, i32)) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct() {
        let layout = ColorVertex::layout().unwrap();

        assert_eq!(layout.stride() as usize, size_of::<ColorVertex>());
        assert_eq!(layout.attributes()[1].offset as usize, std::mem::offset_of!(ColorVertex, color));
    }

    #[test]
    fn aspect_survives_zero_height() {
        assert_eq!(aspect((800, 400)), 2.0);
        assert_eq!(aspect((800, 0)), 800.0);
    }
}
