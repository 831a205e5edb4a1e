use glow::HasContext;

use crate::{error::Error, gl::GlState};

/// Pixel formats supported by [`Texture2D`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single 8-bit channel, sampled as `.r`
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    /// Single 32-bit float channel
    R32F,
    /// 24-bit depth, for depth attachments
    Depth24,
}

impl TextureFormat {
    /// Sized internal format passed to `glTexImage2D`.
    pub const fn internal_format(self) -> u32 {
        match self {
            TextureFormat::R8 => glow::R8,
            TextureFormat::Rg8 => glow::RG8,
            TextureFormat::Rgb8 => glow::RGB8,
            TextureFormat::Rgba8 => glow::RGBA8,
            TextureFormat::R32F => glow::R32F,
            TextureFormat::Depth24 => glow::DEPTH_COMPONENT24,
        }
    }

    /// Client pixel format of uploaded data.
    pub const fn pixel_format(self) -> u32 {
        match self {
            TextureFormat::R8 | TextureFormat::R32F => glow::RED,
            TextureFormat::Rg8 => glow::RG,
            TextureFormat::Rgb8 => glow::RGB,
            TextureFormat::Rgba8 => glow::RGBA,
            TextureFormat::Depth24 => glow::DEPTH_COMPONENT,
        }
    }

    /// Component type of uploaded data.
    pub const fn pixel_type(self) -> u32 {
        match self {
            TextureFormat::R32F => glow::FLOAT,
            TextureFormat::Depth24 => glow::UNSIGNED_INT,
            _ => glow::UNSIGNED_BYTE,
        }
    }

    /// Bytes per pixel of client-side data.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rg8 => 2,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 | TextureFormat::R32F | TextureFormat::Depth24 => 4,
        }
    }

    /// Whether this is a depth format.
    pub const fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth24)
    }
}

/// Sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Nearest,
    Linear,
    /// Linear filtering between mipmap levels; call
    /// [`Texture2D::generate_mipmaps`] after uploading.
    Trilinear,
}

impl TextureFilter {
    const fn min_filter(self) -> u32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
            TextureFilter::Trilinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }

    const fn mag_filter(self) -> u32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear | TextureFilter::Trilinear => glow::LINEAR,
        }
    }
}

/// Behavior of texture coordinates outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

impl TextureWrap {
    const fn gl_enum(self) -> u32 {
        match self {
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
        }
    }
}

/// A 2D texture with fixed size and format.
///
/// Pixel data is row-major with the first row at texture coordinate
/// `v = 0`. Rows are tightly packed; the unpack alignment is adjusted for
/// formats whose rows are not 4-byte aligned.
#[derive(Debug)]
#[must_use = "call `delete(gl)` before dropping to avoid GPU resource leaks"]
pub struct Texture2D {
    texture: glow::Texture,
    width: i32,
    height: i32,
    format: TextureFormat,
}

impl Texture2D {
    /// Allocates a texture; `data` initializes it when given.
    pub fn new(
        gl: &glow::Context,
        width: i32,
        height: i32,
        format: TextureFormat,
        data: Option<&[u8]>,
    ) -> Result<Self, Error> {
        if width <= 0 || height <= 0 {
            return Err(Error::texture_creation_failed(format!(
                "invalid texture size {width}x{height}"
            )));
        }

        if let Some(data) = data {
            let expected = width as usize * height as usize * format.bytes_per_pixel();
            if data.len() != expected {
                return Err(Error::texture_data_size(expected, data.len()));
            }
        }

        let texture = unsafe { gl.create_texture() }.map_err(Error::texture_creation_failed)?;

        let texture = Self { texture, width, height, format };
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture.texture));
            with_unpack_alignment(gl, texture.row_bytes(width), || {
                gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    format.internal_format() as i32,
                    width,
                    height,
                    0,
                    format.pixel_format(),
                    format.pixel_type(),
                    glow::PixelUnpackData::Slice(data),
                );
            });
        }
        texture.apply_sampling(gl, TextureFilter::default(), TextureWrap::default());
        unsafe { gl.bind_texture(glow::TEXTURE_2D, None) };

        Ok(texture)
    }

    /// Sets filtering and wrapping.
    pub fn set_sampling(&self, gl: &glow::Context, filter: TextureFilter, wrap: TextureWrap) {
        unsafe { gl.bind_texture(glow::TEXTURE_2D, Some(self.texture)) };
        self.apply_sampling(gl, filter, wrap);
        unsafe { gl.bind_texture(glow::TEXTURE_2D, None) };
    }

    fn apply_sampling(&self, gl: &glow::Context, filter: TextureFilter, wrap: TextureWrap) {
        unsafe {
            let target = glow::TEXTURE_2D;
            gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter.min_filter() as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter.mag_filter() as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap.gl_enum() as i32);
            gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap.gl_enum() as i32);
        }
    }

    /// Replaces the pixels of a sub-rectangle.
    pub fn upload_region(
        &self,
        gl: &glow::Context,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        data: &[u8],
    ) -> Result<(), Error> {
        if !region_fits((x, y, width, height), (self.width, self.height)) {
            return Err(Error::texture_region_out_of_bounds(
                (x, y, width, height),
                (self.width, self.height),
            ));
        }

        let expected = width as usize * height as usize * self.format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::texture_data_size(expected, data.len()));
        }

        if width == 0 || height == 0 {
            return Ok(());
        }

        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            with_unpack_alignment(gl, self.row_bytes(width), || {
                gl.tex_sub_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    x,
                    y,
                    width,
                    height,
                    self.format.pixel_format(),
                    self.format.pixel_type(),
                    glow::PixelUnpackData::Slice(Some(data)),
                );
            });
            gl.bind_texture(glow::TEXTURE_2D, None);
        }

        Ok(())
    }

    /// Replaces the whole texture contents.
    pub fn upload(&self, gl: &glow::Context, data: &[u8]) -> Result<(), Error> {
        self.upload_region(gl, 0, 0, self.width, self.height, data)
    }

    /// Regenerates the mipmap chain from level 0.
    pub fn generate_mipmaps(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(self.texture));
            gl.generate_mipmap(glow::TEXTURE_2D);
            gl.bind_texture(glow::TEXTURE_2D, None);
        }
    }

    /// Binds the texture to texture unit `unit` (0-based).
    pub fn bind(&self, gl: &glow::Context, state: &mut GlState, unit: u32) {
        state.active_texture(gl, glow::TEXTURE0 + unit);
        unsafe { gl.bind_texture(glow::TEXTURE_2D, Some(self.texture)) };
    }

    /// Width and height in pixels.
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub(crate) fn gl_texture(&self) -> glow::Texture {
        self.texture
    }

    fn row_bytes(&self, width: i32) -> usize {
        width as usize * self.format.bytes_per_pixel()
    }

    /// Deletes the texture, releasing the GPU resource.
    pub fn delete(self, gl: &glow::Context) {
        unsafe { gl.delete_texture(self.texture) };
    }
}

/// Runs `upload` with `GL_UNPACK_ALIGNMENT` matching the row size; the GL
/// default of 4 is restored afterwards.
fn with_unpack_alignment(gl: &glow::Context, row_bytes: usize, upload: impl FnOnce()) {
    let alignment = unpack_alignment(row_bytes);
    if alignment != 4 {
        unsafe { gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment) };
    }
    upload();
    if alignment != 4 {
        unsafe { gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4) };
    }
}

const fn unpack_alignment(row_bytes: usize) -> i32 {
    match row_bytes {
        n if n % 4 == 0 => 4,
        n if n % 2 == 0 => 2,
        _ => 1,
    }
}

fn region_fits((x, y, width, height): (i32, i32, i32, i32), (tex_w, tex_h): (i32, i32)) -> bool {
    let within = |start: i32, len: i32, limit: i32| {
        start >= 0 && len >= 0 && start.checked_add(len).is_some_and(|end| end <= limit)
    };
    within(x, width, tex_w) && within(y, height, tex_h)
}
