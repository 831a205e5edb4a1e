use glint_core::{
    Error, Framebuffer, GlState, RenderContext, ShaderProgram, TextureFormat,
    gl::{ClearFlags, DepthAttachment},
};

use super::{TexturedQuad, triangle::aspect};
use crate::scene::Scene;

const QUAD_SHADER: &str = include_str!("../shaders/quad.vert");
const MANDELBROT_SHADER: &str = include_str!("../shaders/mandelbrot.frag");
const BLIT_SHADER: &str = include_str!("../shaders/blit.frag");

/// Seahorse valley
const CENTER: [f32; 2] = [-0.743_643_9, 0.131_825_9];
const MAX_ZOOM: f32 = 2_000.0;
const MAX_ITERATIONS: i32 = 256;

/// A Mandelbrot zoom rendered offscreen at half resolution, then scaled up.
pub struct FractalScene {
    mandelbrot: ShaderProgram,
    blit: ShaderProgram,
    quad: TexturedQuad,
    target: Framebuffer,
    size: (i32, i32),
    zoom: f32,
}

impl FractalScene {
    pub fn new(gl: &glow::Context, state: &mut GlState, size: (i32, i32)) -> Result<Self, Error> {
        let mandelbrot = super::program(gl, QUAD_SHADER, MANDELBROT_SHADER)?;
        let blit = super::program(gl, QUAD_SHADER, BLIT_SHADER)?;
        let quad = TexturedQuad::new(gl, &blit, false)?;
        quad.check_program(&mandelbrot)?;

        let target = create_target(gl, state, size)?;

        Ok(Self { mandelbrot, blit, quad, target, size, zoom: 1.0 })
    }
}

impl Scene for FractalScene {
    fn update(&mut self, dt: f32) {
        self.zoom = next_zoom(self.zoom, dt);
    }

    fn render(&mut self, ctx: &mut RenderContext) -> Result<(), Error> {
        let gl = ctx.gl;

        // pass 1: fractal into the half resolution target
        self.target.bind(gl, ctx.state);
        self.mandelbrot.bind(gl, ctx.state);
        self.mandelbrot.set_uniform(gl, "u_center", &CENTER)?;
        self.mandelbrot.set_uniform(gl, "u_zoom", &self.zoom)?;
        self.mandelbrot.set_uniform(gl, "u_aspect", &aspect(self.size))?;
        self.mandelbrot.set_uniform(gl, "u_max_iterations", &MAX_ITERATIONS)?;
        self.quad.draw(gl);
        self.target.unbind(gl, ctx.state);

        // pass 2: upscale to the window
        ctx.state
            .viewport(gl, 0, 0, self.size.0, self.size.1)
            .clear_color(gl, 0.0, 0.0, 0.0, 1.0)
            .clear(gl, ClearFlags::COLOR);

        if let Some(texture) = self.target.color_texture(0) {
            texture.bind(gl, ctx.state, 0);
        }
        self.blit.bind(gl, ctx.state);
        self.blit.set_uniform(gl, "u_texture", &0i32)?;
        self.quad.draw(gl);

        Ok(())
    }

    fn resize(&mut self, gl: &glow::Context, state: &mut GlState, size: (i32, i32)) -> Result<(), Error> {
        self.size = size;
        let target = create_target(gl, state, size)?;
        std::mem::replace(&mut self.target, target).delete(gl, state);
        Ok(())
    }

    fn delete(self: Box<Self>, gl: &glow::Context, state: &mut GlState) {
        self.target.delete(gl, state);
        self.quad.delete(gl);
        self.blit.delete(gl, state);
        self.mandelbrot.delete(gl, state);
    }
}

fn create_target(gl: &glow::Context, state: &mut GlState, size: (i32, i32)) -> Result<Framebuffer, Error> {
    Framebuffer::new(
        gl,
        state,
        half_resolution(size),
        &[TextureFormat::Rgba8],
        DepthAttachment::None,
    )
}

fn half_resolution((width, height): (i32, i32)) -> (i32, i32) {
    ((width / 2).max(1), (height / 2).max(1))
}

/// Zooms in exponentially and starts over once the float precision runs out.
fn next_zoom(zoom: f32, dt: f32) -> f32 {
    let zoom = zoom * (dt * 0.35).exp();
    if zoom > MAX_ZOOM { 1.0 } else { zoom }
}
