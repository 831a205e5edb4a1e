use glow::HasContext;
use tracing::debug;

use crate::{
    error::Error,
    gl::{GlState, Texture2D, TextureFilter, TextureFormat, TextureWrap},
};

/// Upper bound on color attachments; the minimum `GL_MAX_COLOR_ATTACHMENTS`.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Depth storage of a [`Framebuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthAttachment {
    #[default]
    None,
    /// Depth renderbuffer; cannot be sampled
    Renderbuffer,
    /// Depth texture, sampleable after rendering
    Texture,
}

#[derive(Debug)]
enum DepthStorage {
    None,
    Renderbuffer(glow::Renderbuffer),
    Texture(Texture2D),
}

/// An offscreen render target with texture color attachments.
#[derive(Debug)]
#[must_use = "call `delete(gl, state)` before dropping to avoid GPU resource leaks"]
pub struct Framebuffer {
    framebuffer: glow::Framebuffer,
    colors: Vec<Texture2D>,
    depth: DepthStorage,
    size: (i32, i32),
}

impl Framebuffer {
    /// Creates a framebuffer with one color texture per entry in
    /// `color_formats`, bound to `COLOR_ATTACHMENT0..`.
    ///
    /// The framebuffer is left unbound.
    pub fn new(
        gl: &glow::Context,
        state: &mut GlState,
        size: (i32, i32),
        color_formats: &[TextureFormat],
        depth: DepthAttachment,
    ) -> Result<Self, Error> {
        validate_attachments(color_formats, depth)?;
        let (width, height) = size;

        let framebuffer =
            unsafe { gl.create_framebuffer() }.map_err(Error::framebuffer_creation_failed)?;
        state.framebuffer(gl, Some(framebuffer));

        let mut colors = Vec::with_capacity(color_formats.len());
        let mut depth_storage = DepthStorage::None;
        let attached = (|| -> Result<(), Error> {
            for (index, format) in color_formats.iter().enumerate() {
                let texture = Texture2D::new(gl, width, height, *format, None)?;
                texture.set_sampling(gl, TextureFilter::Linear, TextureWrap::ClampToEdge);
                unsafe {
                    gl.framebuffer_texture_2d(
                        glow::FRAMEBUFFER,
                        glow::COLOR_ATTACHMENT0 + index as u32,
                        glow::TEXTURE_2D,
                        Some(texture.gl_texture()),
                        0,
                    );
                }
                colors.push(texture);
            }

            depth_storage = create_depth(gl, size, depth)?;

            let draw_buffers: Vec<u32> = (0..colors.len() as u32)
                .map(|i| glow::COLOR_ATTACHMENT0 + i)
                .collect();
            unsafe {
                if draw_buffers.is_empty() {
                    gl.draw_buffer(glow::NONE);
                    gl.read_buffer(glow::NONE);
                } else {
                    gl.draw_buffers(&draw_buffers);
                }
            }

            let status = unsafe { gl.check_framebuffer_status(glow::FRAMEBUFFER) };
            if status == glow::FRAMEBUFFER_COMPLETE {
                Ok(())
            } else {
                Err(Error::framebuffer_incomplete(status))
            }
        })();

        let framebuffer = Self {
            framebuffer,
            colors,
            depth: depth_storage,
            size,
        };
        state.framebuffer(gl, None);

        match attached {
            Ok(()) => {
                debug!(
                    width,
                    height,
                    colors = framebuffer.colors.len(),
                    ?depth,
                    "created framebuffer"
                );
                Ok(framebuffer)
            },
            Err(e) => {
                framebuffer.delete(gl, state);
                Err(e)
            },
        }
    }

    /// Binds the framebuffer for drawing and sets the viewport to cover it.
    pub fn bind(&self, gl: &glow::Context, state: &mut GlState) {
        state.framebuffer(gl, Some(self.framebuffer));
        state.viewport(gl, 0, 0, self.size.0, self.size.1);
    }

    /// Binds the default framebuffer; the caller restores the viewport.
    pub fn unbind(&self, gl: &glow::Context, state: &mut GlState) {
        state.framebuffer(gl, None);
    }

    /// Width and height in pixels.
    pub fn size(&self) -> (i32, i32) {
        self.size
    }

    /// Color texture at attachment `index`.
    pub fn color_texture(&self, index: usize) -> Option<&Texture2D> {
        self.colors.get(index)
    }

    /// Depth texture, when created with [`DepthAttachment::Texture`].
    pub fn depth_texture(&self) -> Option<&Texture2D> {
        match &self.depth {
            DepthStorage::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    /// Deletes the framebuffer together with its attachments.
    pub fn delete(self, gl: &glow::Context, state: &mut GlState) {
        state.forget_framebuffer(self.framebuffer);
        unsafe { gl.delete_framebuffer(self.framebuffer) };

        for texture in self.colors {
            texture.delete(gl);
        }
        match self.depth {
            DepthStorage::None => {},
            DepthStorage::Renderbuffer(rb) => unsafe { gl.delete_renderbuffer(rb) },
            DepthStorage::Texture(texture) => texture.delete(gl),
        }
    }
}

fn create_depth(
    gl: &glow::Context,
    (width, height): (i32, i32),
    depth: DepthAttachment,
) -> Result<DepthStorage, Error> {
    match depth {
        DepthAttachment::None => Ok(DepthStorage::None),
        DepthAttachment::Renderbuffer => unsafe {
            let rb = gl
                .create_renderbuffer()
                .map_err(Error::framebuffer_creation_failed)?;
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(rb));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT24, width, height);
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(rb),
            );
            Ok(DepthStorage::Renderbuffer(rb))
        },
        DepthAttachment::Texture => {
            let texture = Texture2D::new(gl, width, height, TextureFormat::Depth24, None)?;
            unsafe {
                gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    glow::DEPTH_ATTACHMENT,
                    glow::TEXTURE_2D,
                    Some(texture.gl_texture()),
                    0,
                );
            }
            Ok(DepthStorage::Texture(texture))
        },
    }
}

fn validate_attachments(
    color_formats: &[TextureFormat],
    depth: DepthAttachment,
) -> Result<(), Error> {
    if color_formats.is_empty() && depth == DepthAttachment::None {
        return Err(Error::framebuffer_attachment_mismatch("no attachments"));
    }
    if color_formats.len() > MAX_COLOR_ATTACHMENTS {
        return Err(Error::framebuffer_attachment_mismatch(&format!(
            "{} color attachments, at most {MAX_COLOR_ATTACHMENTS} supported",
            color_formats.len()
        )));
    }
    if color_formats.iter().any(|f| f.is_depth()) {
        return Err(Error::framebuffer_attachment_mismatch(
            "depth format used as color attachment",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachments_are_validated() {
        assert!(validate_attachments(&[TextureFormat::Rgba8], DepthAttachment::None).is_ok());
        assert!(validate_attachments(&[], DepthAttachment::Texture).is_ok());

        let err = validate_attachments(&[], DepthAttachment::None).unwrap_err();
        assert!(matches!(err, Error::Framebuffer(_)));

        let err = validate_attachments(&[TextureFormat::Depth24], DepthAttachment::None)
            .unwrap_err();
        assert!(err.to_string().contains("depth format"), "{err}");

        let too_many = [TextureFormat::R8; MAX_COLOR_ATTACHMENTS + 1];
        assert!(validate_attachments(&too_many, DepthAttachment::None).is_err());
    }
}
