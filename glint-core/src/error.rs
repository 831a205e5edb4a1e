use crate::gl::LayoutError;

/// Error categories for the GL wrapper.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Shader compilation, linking, or program creation errors.
    #[error("Shader error: {0}")]
    Shader(String),

    /// GL resource creation or management errors.
    #[error("Resource error: {0}")]
    Resource(String),

    /// Invalid vertex layout description.
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Incomplete or misconfigured framebuffer.
    #[error("Framebuffer error: {0}")]
    Framebuffer(String),

    /// External data loading or parsing errors.
    #[error("Data error: {0}")]
    Data(String),
}

impl Error {
    // Shader errors
    pub(crate) fn shader_creation_failed(detail: &str) -> Self {
        Self::Shader(format!("Shader creation failed: {detail}"))
    }

    pub(crate) fn shader_compile_failed(stage: &str, log: &str) -> Self {
        Self::Shader(format!("{stage} shader compilation failed: {}", log.trim_end()))
    }

    pub(crate) fn shader_program_creation_failed(detail: &str) -> Self {
        Self::Shader(format!("Shader program creation failed: {detail}"))
    }

    pub(crate) fn shader_link_failed(log: &str) -> Self {
        Self::Shader(format!("Shader linking failed: {}", log.trim_end()))
    }

    pub(crate) fn uniform_location_failed(name: &str) -> Self {
        Self::Shader(format!("Failed to get uniform location: {name}"))
    }

    pub(crate) fn uniform_block_not_found(name: &str) -> Self {
        Self::Shader(format!("Failed to get uniform block index: {name}"))
    }

    // Resource errors
    pub(crate) fn buffer_creation_failed(buffer_type: &str, detail: String) -> Self {
        Self::Resource(format!("Failed to create {buffer_type} buffer: {detail}"))
    }

    pub(crate) fn buffer_update_out_of_range(offset: usize, len: usize, capacity: usize) -> Self {
        Self::Resource(format!(
            "Buffer update of {len} elements at offset {offset} exceeds buffer length {capacity}"
        ))
    }

    pub(crate) fn vertex_array_creation_failed(detail: String) -> Self {
        Self::Resource(format!("Failed to create vertex array object: {detail}"))
    }

    pub(crate) fn texture_creation_failed(detail: String) -> Self {
        Self::Resource(format!("Failed to create texture: {detail}"))
    }

    pub(crate) fn texture_data_size(expected: usize, actual: usize) -> Self {
        Self::Data(format!("Texture data holds {actual} bytes, expected {expected}"))
    }

    pub(crate) fn texture_region_out_of_bounds(
        region: (i32, i32, i32, i32),
        size: (i32, i32),
    ) -> Self {
        let (x, y, w, h) = region;
        Self::Resource(format!(
            "Texture region {w}x{h} at ({x}, {y}) exceeds texture size {}x{}",
            size.0, size.1
        ))
    }

    // Framebuffer errors
    pub(crate) fn framebuffer_creation_failed(detail: String) -> Self {
        Self::Framebuffer(format!("Failed to create framebuffer: {detail}"))
    }

    pub(crate) fn framebuffer_incomplete(status: u32) -> Self {
        Self::Framebuffer(format!(
            "Framebuffer incomplete: {} ({status:#06x})",
            framebuffer_status_name(status)
        ))
    }

    pub(crate) fn framebuffer_attachment_mismatch(detail: &str) -> Self {
        Self::Framebuffer(format!("Invalid framebuffer attachments: {detail}"))
    }
}

fn framebuffer_status_name(status: u32) -> &'static str {
    match status {
        glow::FRAMEBUFFER_UNDEFINED => "undefined",
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "incomplete attachment",
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "missing attachment",
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "incomplete draw buffer",
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "incomplete read buffer",
        glow::FRAMEBUFFER_UNSUPPORTED => "unsupported",
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "incomplete multisample",
        glow::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => "incomplete layer targets",
        _ => "unknown status",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framebuffer_status_is_named() {
        let err = Error::framebuffer_incomplete(glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT);
        let msg = err.to_string();
        assert!(msg.contains("missing attachment"), "{msg}");
        assert!(msg.contains("0x8cd7"), "{msg}");
    }

    #[test]
    fn compile_errors_name_the_stage() {
        let err = Error::shader_compile_failed("fragment", "0:1(1): error: syntax error\n");
        assert_eq!(
            err.to_string(),
            "Shader error: fragment shader compilation failed: 0:1(1): error: syntax error"
        );
    }

    #[test]
    fn layout_errors_convert() {
        let err: Error = LayoutError::Empty.into();
        assert!(matches!(err, Error::Layout(LayoutError::Empty)));
    }
}
