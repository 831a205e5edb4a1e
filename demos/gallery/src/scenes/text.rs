use color_eyre::eyre::{Context, Result};
use glint_atlas::{AtlasConfig, AtlasGenerator, Charset, FontSource};
use glint_core::{
    Buffer, BufferTarget, BufferUsage, Drawable, Error, FontAtlasData, FontTexture, GlState, Mat4,
    PrimitiveMode, RenderContext, ShaderProgram, TextLayout, TextMesh, TextVertex, Vertex,
    VertexArray,
    gl::{ClearFlags, render},
};

use crate::scene::{Scene, SceneOptions};

const VERTEX_SHADER: &str = include_str!("../shaders/text.vert");
const FRAGMENT_SHADER: &str = include_str!("../shaders/text.frag");

const MARGIN: f32 = 24.0;

const SAMPLE: &str = "The quick brown fox jumps over the lazy dog.\n\
                      AVATAR Tokyo WAVE LT Yo Te P. F, V.\n\
                      \tfn main() { println!(\"kerning: AV To Wa\"); }";

/// GPU side of a [`TextMesh`].
struct TextBatch {
    program: ShaderProgram,
    font: FontTexture,
    vertices: Buffer<TextVertex>,
    indices: Buffer<u32>,
    vao: VertexArray,
    projection: Mat4,
}

impl TextBatch {
    /// Replaces the drawn text.
    fn set_mesh(&mut self, gl: &glow::Context, mesh: &TextMesh) {
        self.vertices.upload(gl, &mesh.vertices);
        self.indices.upload(gl, &mesh.indices);
        self.vao.set_index_buffer(gl, &self.indices);
    }
}

impl Drawable for TextBatch {
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error> {
        let gl = context.gl;
        context
            .state
            .blend(gl, Some((glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA)));

        self.font.bind(gl, context.state, 0);
        self.program.bind(gl, context.state);
        self.program.set_uniform(gl, "u_atlas", &0i32)?;
        self.program.set_uniform(gl, "u_projection", &self.projection)
    }

    fn draw(&self, context: &mut RenderContext) {
        if !self.indices.is_empty() {
            self.vao.draw(context.gl, PrimitiveMode::Triangles, 0, None);
        }
    }

    fn cleanup(&self, context: &mut RenderContext) {
        context.state.blend(context.gl, None);
    }
}

/// Kerned text from an atlas generated at startup.
pub struct TextScene {
    atlas: FontAtlasData,
    batch: TextBatch,
    size: (i32, i32),
    elapsed: f32,
    shown_seconds: u32,
}

impl TextScene {
    pub fn new(gl: &glow::Context, size: (i32, i32), options: &SceneOptions) -> Result<Self> {
        let atlas = generate_atlas(options)?;

        let program = super::program(gl, VERTEX_SHADER, FRAGMENT_SHADER)?;
        let layout = TextVertex::layout()?;
        program.check_layouts(&[&layout])?;

        let font = FontTexture::new(gl, &atlas)?;
        let vertices = Buffer::new(gl, BufferTarget::Array, BufferUsage::Dynamic)?;
        let indices = Buffer::new(gl, BufferTarget::ElementArray, BufferUsage::Dynamic)?;
        let mut vao = VertexArray::new(gl)?;
        vao.attach(gl, &vertices, &layout)?;

        let mut batch = TextBatch {
            program,
            font,
            vertices,
            indices,
            vao,
            projection: projection(size),
        };
        batch.set_mesh(gl, &compose(&atlas, 0));

        Ok(Self { atlas, batch, size, elapsed: 0.0, shown_seconds: 0 })
    }
}

impl Scene for TextScene {
    fn update(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<(), Error> {
        let seconds = self.elapsed as u32;
        if seconds != self.shown_seconds {
            self.shown_seconds = seconds;
            self.batch.set_mesh(ctx.gl, &compose(&self.atlas, seconds));
        }

        ctx.state
            .viewport(ctx.gl, 0, 0, self.size.0, self.size.1)
            .clear_color(ctx.gl, 0.16, 0.16, 0.21, 1.0)
            .clear(ctx.gl, ClearFlags::COLOR);

        render(ctx, &[&self.batch])
    }

    fn resize(&mut self, _gl: &glow::Context, _state: &mut GlState, size: (i32, i32)) -> Result<(), Error> {
        self.size = size;
        self.batch.projection = projection(size);
        Ok(())
    }

    fn delete(self: Box<Self>, gl: &glow::Context, state: &mut GlState) {
        let batch = self.batch;
        batch.vao.delete(gl);
        batch.vertices.delete(gl);
        batch.indices.delete(gl);
        batch.font.delete(gl);
        batch.program.delete(gl, state);
    }
}

fn generate_atlas(options: &SceneOptions) -> Result<FontAtlasData> {
    let source = FontSource::parse(&options.font);
    let font = source
        .load()
        .wrap_err_with(|| format!("failed to load font '{source}'"))?;

    let config = AtlasConfig { font_size: options.font_size, ..AtlasConfig::default() };
    let (atlas, report) = AtlasGenerator::new(&font, config)?.generate(&Charset::ascii())?;

    tracing::info!(
        font = %report.font_name,
        glyphs = report.glyph_count,
        kerning_pairs = report.kerning_pairs,
        "built font atlas"
    );
    Ok(atlas)
}

/// Builds the sample paragraph plus a caption and an uptime line below it.
fn compose(atlas: &FontAtlasData, seconds: u32) -> TextMesh {
    let body = TextLayout::new(1.0).with_color([248, 248, 242, 255]);
    let caption = TextLayout::new(0.6).with_color([98, 114, 164, 255]);

    let mut mesh = body.layout(atlas, SAMPLE, (MARGIN, MARGIN));
    let below = mesh.bounds.y + mesh.bounds.height + MARGIN;

    let info = format!(
        "{} @ {}px, {} glyphs, {} kerning pairs, {}x{} atlas\nuptime {seconds}s",
        atlas.font_name,
        atlas.font_size,
        atlas.glyphs.len(),
        atlas.kerning.len(),
        atlas.texture_size.0,
        atlas.texture_size.1,
    );
    mesh.extend(&caption.layout(atlas, &info, (MARGIN, below)));
    mesh
}

fn projection((width, height): (i32, i32)) -> Mat4 {
    Mat4::orthographic_from_size(width.max(1) as f32, height.max(1) as f32)
}

#[cfg(test)]
mod tests {
    use glint_data::{AtlasRect, GlyphEntry, LineMetrics};

    use super::*;

    fn atlas() -> FontAtlasData {
        let glyph = |symbol, x| GlyphEntry {
            symbol,
            rect: AtlasRect::new(x, 0, 6, 8),
            bearing: (0, 0),
            advance: 7.0,
        };
        FontAtlasData::new(
            "Test Mono",
            10.0,
            LineMetrics::new(8.0, -2.0, 0.0),
            (32, 32),
            vec![glyph('?', 0), glyph('A', 8)],
            vec![],
            vec![0; 32 * 32],
        )
    }

    #[test]
    fn caption_is_placed_below_the_sample() {
        let atlas = atlas();
        let body = TextLayout::new(1.0).layout(&atlas, SAMPLE, (MARGIN, MARGIN));
        let mesh = compose(&atlas, 3);

        let caption_top = body.bounds.y + body.bounds.height + MARGIN;
        let caption_vertices = &mesh.vertices[body.vertices.len()..];
        assert!(!caption_vertices.is_empty());
        assert!(caption_vertices.iter().all(|v| v.position[1] >= caption_top - 1e-3));
    }

    #[test]
    fn projection_maps_the_window_corners() {
        let p = projection((800, 600));
        let corner = p.transform_point(glint_core::Vec3::new(800.0, 600.0, 0.0));
        assert!((corner.x - 1.0).abs() < 1e-5);
        assert!((corner.y + 1.0).abs() < 1e-5);
    }
}
