use std::{fmt::Debug, marker::PhantomData};

use bytemuck::Pod;
use glow::HasContext;

use crate::error::Error;

/// Binding target of a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Vertex indices
    ElementArray,
    /// Uniform block storage
    Uniform,
}

impl BufferTarget {
    pub(crate) const fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
            BufferTarget::Uniform => glow::UNIFORM_BUFFER,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            BufferTarget::Array => "vertex",
            BufferTarget::ElementArray => "index",
            BufferTarget::Uniform => "uniform",
        }
    }
}

/// Expected update frequency of the buffer contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Written once, drawn many times
    Static,
    /// Rewritten occasionally
    Dynamic,
    /// Rewritten every frame
    Stream,
}

impl BufferUsage {
    pub(crate) const fn gl_enum(self) -> u32 {
        match self {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        }
    }
}

/// Element types usable in an index buffer.
pub trait IndexType: Pod {
    /// GL enum passed to `glDrawElements`
    const GL_TYPE: u32;
}

impl IndexType for u8 {
    const GL_TYPE: u32 = glow::UNSIGNED_BYTE;
}

impl IndexType for u16 {
    const GL_TYPE: u32 = glow::UNSIGNED_SHORT;
}

impl IndexType for u32 {
    const GL_TYPE: u32 = glow::UNSIGNED_INT;
}

/// A GPU buffer holding elements of type `T`.
///
/// The element type only fixes how slices are converted to bytes; the vertex
/// interpretation is described separately by a
/// [`VertexLayout`](crate::gl::VertexLayout).
#[must_use = "call `delete(gl)` before dropping to avoid GPU resource leaks"]
pub struct Buffer<T> {
    buffer: glow::Buffer,
    target: BufferTarget,
    usage: BufferUsage,
    len: usize,
    _element: PhantomData<T>,
}

impl<T> Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("buffer", &self.buffer)
            .field("target", &self.target)
            .field("usage", &self.usage)
            .field("len", &self.len)
            .finish()
    }
}

impl<T: Pod> Buffer<T> {
    /// Creates an empty buffer; storage is allocated by the first upload.
    pub fn new(gl: &glow::Context, target: BufferTarget, usage: BufferUsage) -> Result<Self, Error> {
        let buffer = unsafe { gl.create_buffer() }
            .map_err(|e| Error::buffer_creation_failed(target.label(), e))?;

        Ok(Self {
            buffer,
            target,
            usage,
            len: 0,
            _element: PhantomData,
        })
    }

    /// Creates a buffer and uploads `data` into it.
    pub fn with_data(
        gl: &glow::Context,
        target: BufferTarget,
        usage: BufferUsage,
        data: &[T],
    ) -> Result<Self, Error> {
        let mut buffer = Self::new(gl, target, usage)?;
        buffer.upload(gl, data);
        Ok(buffer)
    }

    /// Replaces the buffer storage with `data`.
    ///
    /// Leaves the buffer bound to its target.
    pub fn upload(&mut self, gl: &glow::Context, data: &[T]) {
        self.bind(gl);
        unsafe {
            gl.buffer_data_u8_slice(
                self.target.gl_enum(),
                bytemuck::cast_slice(data),
                self.usage.gl_enum(),
            );
        }
        self.len = data.len();
    }

    /// Overwrites `data.len()` elements starting at element `offset`
    /// without reallocating.
    pub fn update(&self, gl: &glow::Context, offset: usize, data: &[T]) -> Result<(), Error> {
        let end = offset.checked_add(data.len());
        if end.is_none_or(|end| end > self.len) {
            return Err(Error::buffer_update_out_of_range(offset, data.len(), self.len));
        }

        self.bind(gl);
        unsafe {
            gl.buffer_sub_data_u8_slice(
                self.target.gl_enum(),
                (offset * size_of::<T>()) as i32,
                bytemuck::cast_slice(data),
            );
        }

        Ok(())
    }

    /// Binds the buffer to its target.
    pub fn bind(&self, gl: &glow::Context) {
        unsafe { gl.bind_buffer(self.target.gl_enum(), Some(self.buffer)) };
    }

    pub fn unbind(&self, gl: &glow::Context) {
        unsafe { gl.bind_buffer(self.target.gl_enum(), None) };
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the stored data in bytes.
    pub fn byte_len(&self) -> usize {
        self.len * size_of::<T>()
    }

    pub fn target(&self) -> BufferTarget {
        self.target
    }

    pub(crate) fn gl_buffer(&self) -> glow::Buffer {
        self.buffer
    }

    /// Deletes the buffer, releasing the GPU resource.
    pub fn delete(self, gl: &glow::Context) {
        unsafe { gl.delete_buffer(self.buffer) };
    }
}
