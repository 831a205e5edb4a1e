use bitflags::bitflags;
use glow::HasContext;

bitflags! {
    /// Buffers cleared by [`GlState::clear`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = glow::COLOR_BUFFER_BIT;
        const DEPTH = glow::DEPTH_BUFFER_BIT;
        const STENCIL = glow::STENCIL_BUFFER_BIT;
    }
}

/// Manages simple GL state to reduce redundant state changes
#[derive(Debug)]
pub struct GlState {
    // Viewport dimensions
    viewport: [i32; 4], // [x, y, width, height]

    // Clear color
    clear_color: [f32; 4],

    // Blending; None when disabled
    blend: Option<(u32, u32)>, // (src_factor, dst_factor)

    // Depth testing
    depth_test: bool,

    // Active texture unit
    active_texture_unit: u32,

    // Bound program
    program: Option<glow::Program>,

    // Bound framebuffer; None is the default framebuffer
    framebuffer: Option<glow::Framebuffer>,

    max_vertex_attribs: u32,
}

impl GlState {
    /// Create a new GLState object with GL defaults
    pub fn new(gl: &glow::Context) -> Self {
        let max_vertex_attribs = unsafe { gl.get_parameter_i32(glow::MAX_VERTEX_ATTRIBS) };

        Self {
            viewport: [0, 0, 0, 0],
            clear_color: [0.0, 0.0, 0.0, 0.0],
            blend: None,
            depth_test: false,
            active_texture_unit: glow::TEXTURE0,
            program: None,
            framebuffer: None,
            max_vertex_attribs: max_vertex_attribs.max(0) as u32,
        }
    }

    /// Number of vertex attribute locations supported by the driver.
    pub fn max_vertex_attribs(&self) -> u32 {
        self.max_vertex_attribs
    }

    /// Set viewport dimensions
    pub fn viewport(
        &mut self,
        gl: &glow::Context,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> &mut Self {
        let new_viewport = [x, y, width, height];
        if self.viewport != new_viewport {
            unsafe { gl.viewport(x, y, width, height) };
            self.viewport = new_viewport;
        }
        self
    }

    /// Set clear color
    pub fn clear_color(&mut self, gl: &glow::Context, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        let new_color = [r, g, b, a];
        if self.clear_color != new_color {
            unsafe { gl.clear_color(r, g, b, a) };
            self.clear_color = new_color;
        }
        self
    }

    /// Clears the selected buffers of the bound framebuffer.
    pub fn clear(&mut self, gl: &glow::Context, flags: ClearFlags) -> &mut Self {
        unsafe { gl.clear(flags.bits()) };
        self
    }

    /// Enables blending with the given factors, or disables it for `None`.
    pub fn blend(&mut self, gl: &glow::Context, factors: Option<(u32, u32)>) -> &mut Self {
        if self.blend == factors {
            return self;
        }

        match factors {
            Some((src, dst)) => unsafe {
                if self.blend.is_none() {
                    gl.enable(glow::BLEND);
                }
                gl.blend_func(src, dst);
            },
            None => unsafe { gl.disable(glow::BLEND) },
        }
        self.blend = factors;
        self
    }

    /// Enable or disable depth testing
    pub fn depth_test(&mut self, gl: &glow::Context, enable: bool) -> &mut Self {
        if self.depth_test != enable {
            if enable {
                unsafe { gl.enable(glow::DEPTH_TEST) };
            } else {
                unsafe { gl.disable(glow::DEPTH_TEST) };
            }
            self.depth_test = enable;
        }
        self
    }

    /// Set active texture unit
    pub fn active_texture(&mut self, gl: &glow::Context, texture_unit: u32) -> &mut Self {
        if self.active_texture_unit != texture_unit {
            unsafe { gl.active_texture(texture_unit) };
            self.active_texture_unit = texture_unit;
        }
        self
    }

    /// Bind a shader program, or unbind with `None`
    pub fn use_program(&mut self, gl: &glow::Context, program: Option<glow::Program>) -> &mut Self {
        if self.program != program {
            unsafe { gl.use_program(program) };
            self.program = program;
        }
        self
    }

    /// Bind a framebuffer for reading and drawing; `None` binds the default
    /// framebuffer.
    pub fn framebuffer(
        &mut self,
        gl: &glow::Context,
        framebuffer: Option<glow::Framebuffer>,
    ) -> &mut Self {
        if self.framebuffer != framebuffer {
            unsafe { gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer) };
            self.framebuffer = framebuffer;
        }
        self
    }

    /// Forgets a deleted program so a recycled name is rebound.
    pub(crate) fn forget_program(&mut self, program: glow::Program) {
        if self.program == Some(program) {
            self.program = None;
        }
    }

    /// Forgets a deleted framebuffer; GL falls back to the default one.
    pub(crate) fn forget_framebuffer(&mut self, framebuffer: glow::Framebuffer) {
        if self.framebuffer == Some(framebuffer) {
            self.framebuffer = None;
        }
    }

    /// Reset all tracked state to GL defaults
    pub fn reset(&mut self, gl: &glow::Context) {
        self.blend(gl, None);
        self.depth_test(gl, false);
        self.active_texture(gl, glow::TEXTURE0);
        self.use_program(gl, None);
        self.framebuffer(gl, None);

        // Note: We don't reset viewport or clear_color as these are typically
        // set based on window dimensions or application needs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_flags_match_gl_bits() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert_eq!(flags.bits(), glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
    }
}
