use std::fmt::Debug;

use bytemuck::Pod;
use glow::HasContext;

use crate::{
    error::Error,
    gl::{Buffer, BufferTarget, BufferUsage, ShaderProgram},
};

/// A uniform buffer holding a single `std140` struct.
///
/// `T` must match the block's `std140` layout; pad `vec3` members to 16
/// bytes and keep matrices column-major.
#[derive(Debug)]
pub struct UniformBufferObject<T> {
    buffer: Buffer<T>,
    binding_point: u32,
}

impl<T: Pod> UniformBufferObject<T> {
    /// Allocates the buffer with `initial` as its contents.
    pub fn new(gl: &glow::Context, binding_point: u32, initial: &T) -> Result<Self, Error> {
        let buffer = Buffer::with_data(
            gl,
            BufferTarget::Uniform,
            BufferUsage::Dynamic,
            std::slice::from_ref(initial),
        )?;
        buffer.unbind(gl);

        Ok(Self { buffer, binding_point })
    }

    pub fn binding_point(&self) -> u32 {
        self.binding_point
    }

    /// Links the named block of `shader` to this buffer's binding point and
    /// binds the buffer there.
    pub fn bind_to_shader(
        &self,
        gl: &glow::Context,
        shader: &ShaderProgram,
        block_name: &str,
    ) -> Result<(), Error> {
        shader.bind_uniform_block(gl, block_name, self.binding_point)?;
        self.bind_base(gl);
        Ok(())
    }

    /// Binds the buffer to its indexed binding point.
    pub fn bind_base(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_buffer_base(
                glow::UNIFORM_BUFFER,
                self.binding_point,
                Some(self.buffer.gl_buffer()),
            );
        }
    }

    /// Replaces the buffer contents.
    pub fn upload_data(&self, gl: &glow::Context, data: &T) -> Result<(), Error> {
        self.buffer.update(gl, 0, std::slice::from_ref(data))?;
        self.buffer.unbind(gl);
        Ok(())
    }

    /// Deletes the UBO, releasing the GPU resource.
    pub fn delete(self, gl: &glow::Context) {
        self.buffer.delete(gl);
    }
}
