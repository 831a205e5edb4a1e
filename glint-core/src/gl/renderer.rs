use crate::{error::Error, gl::context::GlState};

/// Rendering context that provides access to GL state.
pub struct RenderContext<'a> {
    pub gl: &'a glow::Context,
    pub state: &'a mut GlState,
}

impl<'a> RenderContext<'a> {
    pub fn new(gl: &'a glow::Context, state: &'a mut GlState) -> Self {
        Self { gl, state }
    }
}

/// Trait for objects that can be rendered.
pub trait Drawable {
    /// Prepares the object for rendering.
    ///
    /// Binds the program, textures and uniforms; fails when per-frame data
    /// cannot be uploaded.
    fn prepare(&self, context: &mut RenderContext) -> Result<(), Error>;

    /// Issues the draw calls. State is already set up by `prepare()`.
    fn draw(&self, context: &mut RenderContext);

    /// Restores state changed by `prepare()` that other drawables do not
    /// expect.
    fn cleanup(&self, _context: &mut RenderContext) {}
}

/// Runs the prepare, draw, cleanup sequence for each drawable in order.
///
/// Stops at the first drawable that fails to prepare; drawables before it
/// have been drawn.
pub fn render(context: &mut RenderContext, drawables: &[&dyn Drawable]) -> Result<(), Error> {
    for drawable in drawables {
        drawable.prepare(context)?;
        drawable.draw(context);
        drawable.cleanup(context);
    }

    Ok(())
}
