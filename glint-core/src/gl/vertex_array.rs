use bytemuck::Pod;
use glow::HasContext;
use tracing::trace;

use crate::{
    error::Error,
    gl::{Buffer, BufferTarget, IndexType, LayoutError, VertexLayout},
};

/// Primitive assembly mode of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    /// `GL_POINTS`
    Points,
    /// `GL_LINES`
    Lines,
    /// `GL_LINE_STRIP`
    LineStrip,
    /// `GL_TRIANGLES`
    Triangles,
    /// `GL_TRIANGLE_STRIP`
    TriangleStrip,
    /// `GL_TRIANGLE_FAN`
    TriangleFan,
}

impl PrimitiveMode {
    /// The GL enum passed to draw calls.
    pub const fn gl_enum(self) -> u32 {
        match self {
            PrimitiveMode::Points => glow::POINTS,
            PrimitiveMode::Lines => glow::LINES,
            PrimitiveMode::LineStrip => glow::LINE_STRIP,
            PrimitiveMode::Triangles => glow::TRIANGLES,
            PrimitiveMode::TriangleStrip => glow::TRIANGLE_STRIP,
            PrimitiveMode::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexBinding {
    gl_type: u32,
    count: usize,
}

/// A vertex array object: vertex buffers bound to attribute locations
/// through [`VertexLayout`]s, plus an optional index buffer.
#[derive(Debug)]
#[must_use = "call `delete(gl)` before dropping to avoid GPU resource leaks"]
pub struct VertexArray {
    vao: glow::VertexArray,
    layouts: Vec<VertexLayout>,
    index: Option<IndexBinding>,
    /// Vertices in the shortest per-vertex buffer
    vertex_count: Option<usize>,
}

impl VertexArray {
    /// Creates an empty vertex array object.
    pub fn new(gl: &glow::Context) -> Result<Self, Error> {
        let vao =
            unsafe { gl.create_vertex_array() }.map_err(Error::vertex_array_creation_failed)?;

        Ok(Self { vao, layouts: Vec::new(), index: None, vertex_count: None })
    }

    /// Feeds the layout's attribute locations from `buffer`.
    ///
    /// Fails when a location is already fed by a previously attached buffer.
    ///
    /// Buffers with per-vertex attributes bound the default count of
    /// non-indexed draws; the count is taken from `buffer.len()` now, see
    /// [`set_vertex_count`](Self::set_vertex_count) for buffers re-uploaded
    /// later.
    pub fn attach<T: Pod>(
        &mut self,
        gl: &glow::Context,
        buffer: &Buffer<T>,
        layout: &VertexLayout,
    ) -> Result<(), Error> {
        if let Some(location) = layout.locations().find(|l| self.provides(*l)) {
            return Err(LayoutError::DuplicateLocation(location).into());
        }

        self.bind(gl);
        buffer.bind(gl);
        let result = layout.apply(gl, 0);
        self.unbind(gl);
        buffer.unbind(gl);
        result?;

        trace!(
            attributes = layout.attributes().len(),
            stride = layout.stride(),
            "attached vertex buffer"
        );
        if layout.attributes().iter().any(|a| a.divisor == 0) {
            self.vertex_count = Some(shortest(self.vertex_count, buffer.len()));
        }
        self.layouts.push(layout.clone());
        Ok(())
    }

    /// Overrides the default vertex count of non-indexed draws, e.g. after
    /// re-uploading an attached buffer with a different length.
    pub fn set_vertex_count(&mut self, count: usize) {
        self.vertex_count = Some(count);
    }

    /// Binds `indices` as the element buffer of this vertex array.
    ///
    /// The index count used by [`draw`](Self::draw) is captured here: call
    /// this again after uploading a different number of indices to the
    /// buffer.
    pub fn set_index_buffer<I: IndexType>(&mut self, gl: &glow::Context, indices: &Buffer<I>) {
        debug_assert_eq!(indices.target(), BufferTarget::ElementArray);

        self.bind(gl);
        indices.bind(gl);
        self.unbind(gl);

        self.index = Some(IndexBinding { gl_type: I::GL_TYPE, count: indices.len() });
    }

    /// Whether an attached layout feeds `location`.
    pub fn provides(&self, location: u32) -> bool {
        self.layouts
            .iter()
            .any(|layout| layout.locations().any(|l| l == location))
    }

    /// Layouts attached so far, in attachment order.
    pub fn layouts(&self) -> impl Iterator<Item = &VertexLayout> {
        self.layouts.iter()
    }

    /// Makes this the current vertex array.
    pub fn bind(&self, gl: &glow::Context) {
        unsafe { gl.bind_vertex_array(Some(self.vao)) };
    }

    /// Unbinds any vertex array.
    pub fn unbind(&self, gl: &glow::Context) {
        unsafe { gl.bind_vertex_array(None) };
    }

    /// Draws `count` vertices starting at `first`. With `count` set to
    /// `None`, draws the rest of the index buffer when one is set, or else
    /// the rest of the attached vertex buffers.
    pub fn draw(&self, gl: &glow::Context, mode: PrimitiveMode, first: usize, count: Option<usize>) {
        self.draw_instanced(gl, mode, first, count, 1);
    }

    /// Instanced version of [`draw`](Self::draw); attributes with a non-zero
    /// divisor advance per instance.
    pub fn draw_instanced(
        &self,
        gl: &glow::Context,
        mode: PrimitiveMode,
        first: usize,
        count: Option<usize>,
        instances: usize,
    ) {
        let total = default_count(self.index, self.vertex_count);
        let count = resolve_count(total, first, count);
        if count == 0 {
            trace!(first, "skipped empty draw");
            return;
        }

        self.bind(gl);
        unsafe {
            match self.index {
                Some(index) => {
                    let offset = (first * index_size(index.gl_type)) as i32;
                    if instances == 1 {
                        gl.draw_elements(mode.gl_enum(), count as i32, index.gl_type, offset);
                    } else {
                        gl.draw_elements_instanced(
                            mode.gl_enum(),
                            count as i32,
                            index.gl_type,
                            offset,
                            instances as i32,
                        );
                    }
                },
                None => {
                    if instances == 1 {
                        gl.draw_arrays(mode.gl_enum(), first as i32, count as i32);
                    } else {
                        gl.draw_arrays_instanced(
                            mode.gl_enum(),
                            first as i32,
                            count as i32,
                            instances as i32,
                        );
                    }
                },
            }
        }
        self.unbind(gl);
    }

    /// Number of indices drawn by default, if an index buffer is set.
    pub fn index_count(&self) -> Option<usize> {
        self.index.map(|i| i.count)
    }

    /// Number of vertices drawn by default by non-indexed draws, if a
    /// per-vertex buffer is attached.
    pub fn vertex_count(&self) -> Option<usize> {
        self.vertex_count
    }

    /// Deletes the vertex array; attached buffers are left alive.
    pub fn delete(self, gl: &glow::Context) {
        unsafe { gl.delete_vertex_array(self.vao) };
    }
}

fn shortest(current: Option<usize>, len: usize) -> usize {
    current.map_or(len, |count| count.min(len))
}

/// Indexed draws cover the index buffer, others the vertex buffers.
fn default_count(index: Option<IndexBinding>, vertex_count: Option<usize>) -> usize {
    match index {
        Some(index) => index.count,
        None => vertex_count.unwrap_or(0),
    }
}

/// Elements drawn from `first`, given `total` available elements.
fn resolve_count(total: usize, first: usize, count: Option<usize>) -> usize {
    count.unwrap_or(total.saturating_sub(first))
}

const fn index_size(gl_type: u32) -> usize {
    match gl_type {
        glow::UNSIGNED_BYTE => 1,
        glow::UNSIGNED_SHORT => 2,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_sizes() {
        assert_eq!(index_size(<u8 as IndexType>::GL_TYPE), 1);
        assert_eq!(index_size(<u16 as IndexType>::GL_TYPE), 2);
        assert_eq!(index_size(<u32 as IndexType>::GL_TYPE), 4);
    }

    #[test]
    fn vertex_count_is_the_shortest_buffer() {
        assert_eq!(shortest(None, 3), 3);
        assert_eq!(shortest(Some(3), 8), 3);
        assert_eq!(shortest(Some(8), 4), 4);
    }

    #[test]
    fn non_indexed_draws_use_the_vertex_count() {
        assert_eq!(resolve_count(default_count(None, Some(3)), 0, None), 3);
        assert_eq!(default_count(None, None), 0);
    }

    #[test]
    fn indexed_draws_use_the_bound_index_count() {
        let index = IndexBinding { gl_type: glow::UNSIGNED_INT, count: 36 };
        assert_eq!(default_count(Some(index), Some(24)), 36);

        // rebinding a re-uploaded buffer replaces the captured count
        let grown = IndexBinding { count: 72, ..index };
        assert_eq!(resolve_count(default_count(Some(grown), Some(24)), 0, None), 72);
    }

    #[test]
    fn default_count_covers_the_rest_of_the_buffer() {
        assert_eq!(resolve_count(3, 0, None), 3);
        assert_eq!(resolve_count(36, 6, None), 30);
        assert_eq!(resolve_count(3, 5, None), 0);
        assert_eq!(resolve_count(3, 0, Some(2)), 2);
    }

    #[test]
    fn primitive_modes() {
        assert_eq!(PrimitiveMode::Triangles.gl_enum(), glow::TRIANGLES);
        assert_eq!(PrimitiveMode::TriangleStrip.gl_enum(), glow::TRIANGLE_STRIP);
        assert_eq!(PrimitiveMode::LineStrip.gl_enum(), glow::LINE_STRIP);
    }
}
