use bytemuck::{Pod, Zeroable};
use glint_core::{
    AttributeFormat, Buffer, BufferTarget, BufferUsage, Drawable, Error, GlState, Mat4,
    PrimitiveMode, RenderContext, ShaderProgram, Vec3, Vertex, VertexArray, VertexLayout,
    gl::{ClearFlags, LayoutError, PackedFormat, UniformBufferObject, render},
};

use super::triangle::aspect;
use crate::scene::Scene;

const VERTEX_SHADER: &str = include_str!("../shaders/cube.vert");
const FRAGMENT_SHADER: &str = include_str!("../shaders/cube.frag");

const CAMERA_BINDING: u32 = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CubeVertex {
    position: [f32; 3],
    /// Signed normalized 2-10-10-10 normal
    normal: u32,
}

impl Vertex for CubeVertex {
    fn layout() -> Result<VertexLayout, LayoutError> {
        VertexLayout::builder()
            .attribute(0, AttributeFormat::float(3))
            .attribute(1, AttributeFormat::packed(PackedFormat::Int2101010Rev, true))
            .build()
    }
}

/// `std140` block `Camera`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct CameraBlock {
    projection: [f32; 16],
    view: [f32; 16],
    model: [f32; 16],
}

/// Four vertices per face so every face gets a flat normal.
fn cube_geometry() -> (Vec<CubeVertex>, Vec<u16>) {
    // normal, then the face's tangent axes
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (n, u, v) in FACES {
        let base = vertices.len() as u16;
        let normal = PackedFormat::pack_snorm(n[0], n[1], n[2], 0.0);

        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let position = [0, 1, 2].map(|i| (n[i] + su * u[i] + sv * v[i]) * 0.5);
            vertices.push(CubeVertex { position, normal });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    (vertices, indices)
}

struct CubeMesh {
    program: ShaderProgram,
    camera: UniformBufferObject<CameraBlock>,
    vertices: Buffer<CubeVertex>,
    indices: Buffer<u16>,
    vao: VertexArray,
    block: CameraBlock,
}

impl Drawable for CubeMesh {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        context.state.depth_test(context.gl, true);
        self.program.bind(context.gl, context.state);

        self.camera.upload_data(context.gl, &self.block)?;
        self.camera.bind_base(context.gl);

        self.program.set_uniform(context.gl, "u_light_dir", &[0.4f32, 0.8, 0.6])?;
        self.program.set_uniform(context.gl, "u_color", &[0.74f32, 0.58, 0.98])
    }

    fn draw(&self, context: &mut RenderContext) {
        self.vao.draw(context.gl, PrimitiveMode::Triangles, 0, None);
    }

    fn cleanup(&self, context: &mut RenderContext) {
        context.state.depth_test(context.gl, false);
    }
}

/// A lit cube rotating about two axes.
pub struct CubeScene {
    mesh: CubeMesh,
    size: (i32, i32),
    time: f32,
}

impl CubeScene {
    pub fn new(gl: &glow::Context, size: (i32, i32)) -> Result<Self, Error> {
        let program = super::program(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let layout = CubeVertex::layout()?;
        program.check_layouts(&[&layout])?;

        let (vertices, indices) = cube_geometry();
        let vertices = Buffer::with_data(gl, BufferTarget::Array, BufferUsage::Static, &vertices)?;
        let indices =
            Buffer::with_data(gl, BufferTarget::ElementArray, BufferUsage::Static, &indices)?;

        let mut vao = VertexArray::new(gl)?;
        vao.attach(gl, &vertices, &layout)?;
        vao.set_index_buffer(gl, &indices);

        let block = camera_block(size, 0.0);
        let camera = UniformBufferObject::new(gl, CAMERA_BINDING, &block)?;
        camera.bind_to_shader(gl, &program, "Camera")?;

        let mesh = CubeMesh { program, camera, vertices, indices, vao, block };
        Ok(Self { mesh, size, time: 0.0 })
    }
}

impl Scene for CubeScene {
    fn update(&mut self, dt: f32) {
        self.time += dt;
        self.mesh.block = camera_block(self.size, self.time);
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<(), Error> {
        ctx.state
            .viewport(ctx.gl, 0, 0, self.size.0, self.size.1)
            .clear_color(ctx.gl, 0.1, 0.1, 0.14, 1.0)
            .clear(ctx.gl, ClearFlags::COLOR | ClearFlags::DEPTH);

        render(ctx, &[&self.mesh])
    }

    fn resize(&mut self, _gl: &glow::Context, _state: &mut GlState, size: (i32, i32)) -> Result<(), Error> {
        self.size = size;
        self.mesh.block = camera_block(size, self.time);
        Ok(())
    }

    fn delete(self: Box<Self>, gl: &glow::Context, state: &mut GlState) {
        let mesh = self.mesh;
        mesh.vao.delete(gl);
        mesh.vertices.delete(gl);
        mesh.indices.delete(gl);
        mesh.camera.delete(gl);
        mesh.program.delete(gl, state);
    }
}

fn camera_block(size: (i32, i32), time: f32) -> CameraBlock {
    let projection = Mat4::perspective(45f32.to_radians(), aspect(size), 0.1, 100.0);
    let view = Mat4::look_at(
        Vec3::new(0.0, 1.2, 3.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    );
    let model = Mat4::rotation_y(time * 0.9) * Mat4::rotation_x(time * 0.4);

    CameraBlock {
        projection: projection.data,
        view: view.data,
        model: model.data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_four_vertices_per_face() {
        let (vertices, indices) = cube_geometry();

        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn face_vertices_lie_on_the_unit_cube() {
        let (vertices, _) = cube_geometry();

        for v in &vertices {
            assert!(v.position.iter().all(|c| c.abs() == 0.5), "{:?}", v.position);
        }
    }

    #[test]
    fn layout_covers_the_vertex() {
        let layout = CubeVertex::layout().unwrap();
        assert_eq!(layout.stride() as usize, size_of::<CubeVertex>());
    }

    #[test]
    fn camera_block_is_std140_sized() {
        assert_eq!(size_of::<CameraBlock>(), 3 * 64);
    }
}
