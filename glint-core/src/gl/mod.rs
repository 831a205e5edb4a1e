mod buffer;
pub(crate) mod context;
mod framebuffer;
mod layout;
mod program;
pub(crate) mod renderer;
mod texture;
mod ubo;
mod vertex_array;

pub use buffer::{Buffer, BufferTarget, BufferUsage, IndexType};
pub use context::{ClearFlags, GlState};
pub use framebuffer::{DepthAttachment, Framebuffer, MAX_COLOR_ATTACHMENTS};
pub use layout::{
    AttributeData, AttributeFormat, AttributeKind, LayoutError, MAX_STRIDE, PackedFormat,
    ScalarType, Vertex, VertexAttribute, VertexLayout, VertexLayoutBuilder,
};
pub use program::{ActiveAttribute, ShaderProgram, Uniform};
pub use renderer::{Drawable, RenderContext, render};
pub use texture::{Texture2D, TextureFilter, TextureFormat, TextureWrap};
pub use ubo::UniformBufferObject;
pub use vertex_array::{PrimitiveMode, VertexArray};
