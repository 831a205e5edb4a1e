use std::fmt::Debug;

use glow::HasContext;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{
    GlslVersion,
    error::Error,
    gl::{GlState, LayoutError, VertexLayout},
    mat4::Mat4,
};

/// An active vertex input reported by the linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAttribute {
    pub name: String,
    pub location: u32,
    /// GL type enum, e.g. `GL_FLOAT_VEC3`
    pub gl_type: u32,
}

/// A linked vertex + fragment shader program.
///
/// Active uniforms and attributes are queried once after linking; uniform
/// lookups by name go through that cache.
#[derive(Debug)]
pub struct ShaderProgram {
    program: glow::Program,
    uniforms: FxHashMap<String, glow::UniformLocation>,
    attributes: Vec<ActiveAttribute>,
}

impl ShaderProgram {
    /// Compiles and links complete GLSL sources, `#version` line included.
    pub fn create(
        gl: &glow::Context,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, Error> {
        let program = unsafe { gl.create_program() }
            .map_err(|e| Error::shader_program_creation_failed(&e))?;

        let vertex_shader = match compile_shader(gl, ShaderStage::Vertex, vertex_source) {
            Ok(shader) => shader,
            Err(e) => {
                unsafe { gl.delete_program(program) };
                return Err(e);
            },
        };
        let fragment_shader = match compile_shader(gl, ShaderStage::Fragment, fragment_source) {
            Ok(shader) => shader,
            Err(e) => unsafe {
                gl.delete_shader(vertex_shader);
                gl.delete_program(program);
                return Err(e);
            },
        };

        unsafe {
            gl.attach_shader(program, vertex_shader);
            gl.attach_shader(program, fragment_shader);
            gl.link_program(program);

            // shaders are no longer needed after linking
            gl.detach_shader(program, vertex_shader);
            gl.detach_shader(program, fragment_shader);
            gl.delete_shader(vertex_shader);
            gl.delete_shader(fragment_shader);
        }

        if let Err(e) = check_link_status(gl, program) {
            unsafe { gl.delete_program(program) };
            return Err(e);
        }

        let uniforms = query_uniforms(gl, program);
        let attributes = query_attributes(gl, program);
        debug!(
            uniforms = uniforms.len(),
            attributes = attributes.len(),
            "linked shader program"
        );

        Ok(Self { program, uniforms, attributes })
    }

    /// Compiles shader bodies after prefixing them with the version preamble.
    pub fn from_sources(
        gl: &glow::Context,
        version: GlslVersion,
        vertex_body: &str,
        fragment_body: &str,
    ) -> Result<Self, Error> {
        let vertex_source = format!("{}{vertex_body}", version.vertex_preamble());
        let fragment_source = format!("{}{fragment_body}", version.fragment_preamble());
        Self::create(gl, &vertex_source, &fragment_source)
    }

    /// Makes this program current.
    pub fn bind(&self, gl: &glow::Context, state: &mut GlState) {
        state.use_program(gl, Some(self.program));
    }

    /// Cached location of an active uniform.
    ///
    /// Array uniforms are found both as `name` and `name[0]`.
    pub fn uniform_location(&self, name: &str) -> Result<&glow::UniformLocation, Error> {
        self.uniforms
            .get(name)
            .ok_or_else(|| Error::uniform_location_failed(name))
    }

    /// Whether the linked program has an active uniform `name`.
    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    /// Sets a uniform of the currently bound program.
    pub fn set_uniform<U: Uniform + ?Sized>(
        &self,
        gl: &glow::Context,
        name: &str,
        value: &U,
    ) -> Result<(), Error> {
        let location = self.uniform_location(name)?;
        value.set(gl, location);
        Ok(())
    }

    /// Associates the named uniform block with a binding point.
    pub fn bind_uniform_block(
        &self,
        gl: &glow::Context,
        block_name: &str,
        binding_point: u32,
    ) -> Result<(), Error> {
        let index = unsafe { gl.get_uniform_block_index(self.program, block_name) }
            .ok_or_else(|| Error::uniform_block_not_found(block_name))?;

        unsafe { gl.uniform_block_binding(self.program, index, binding_point) };
        Ok(())
    }

    /// The vertex inputs used by the program.
    pub fn attributes(&self) -> &[ActiveAttribute] {
        &self.attributes
    }

    /// Location of the active attribute `name`.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    /// Verifies that every active attribute is fed by one of `layouts`.
    pub fn check_layouts(&self, layouts: &[&VertexLayout]) -> Result<(), LayoutError> {
        let missing = self.attributes.iter().find(|attr| {
            !layouts
                .iter()
                .any(|layout| layout.locations().any(|l| l == attr.location))
        });

        match missing {
            Some(attr) => Err(LayoutError::MissingAttribute {
                name: attr.name.clone(),
                location: attr.location,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn gl_program(&self) -> glow::Program {
        self.program
    }

    /// Deletes the program, releasing the GPU resource.
    pub fn delete(self, gl: &glow::Context, state: &mut GlState) {
        state.forget_program(self.program);
        unsafe { gl.delete_program(self.program) };
    }
}

/// Values that can be written to a uniform location.
pub trait Uniform {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation);
}

impl Uniform for f32 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_f32(Some(location), *self) };
    }
}

impl Uniform for [f32; 2] {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_2_f32(Some(location), self[0], self[1]) };
    }
}

impl Uniform for [f32; 3] {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_3_f32(Some(location), self[0], self[1], self[2]) };
    }
}

impl Uniform for [f32; 4] {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_4_f32(Some(location), self[0], self[1], self[2], self[3]) };
    }
}

impl Uniform for i32 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_i32(Some(location), *self) };
    }
}

impl Uniform for [i32; 2] {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_2_i32(Some(location), self[0], self[1]) };
    }
}

impl Uniform for u32 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_u32(Some(location), *self) };
    }
}

impl Uniform for bool {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_i32(Some(location), *self as i32) };
    }
}

impl Uniform for [f32] {
    /// Uploads a `float[]` uniform array.
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_1_f32_slice(Some(location), self) };
    }
}

impl Uniform for Mat4 {
    fn set(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe { gl.uniform_matrix_4_f32_slice(Some(location), false, &self.data) };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    const fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    const fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

fn compile_shader(
    gl: &glow::Context,
    stage: ShaderStage,
    source: &str,
) -> Result<glow::Shader, Error> {
    let shader = unsafe { gl.create_shader(stage.gl_enum()) }
        .map_err(|e| Error::shader_creation_failed(&e))?;

    unsafe {
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
    }

    if unsafe { gl.get_shader_compile_status(shader) } {
        let log = unsafe { gl.get_shader_info_log(shader) };
        if !log.trim().is_empty() {
            warn!(stage = stage.label(), log = log.trim_end(), "shader compiled with warnings");
        }
        Ok(shader)
    } else {
        let log = unsafe { gl.get_shader_info_log(shader) };
        unsafe { gl.delete_shader(shader) };
        Err(Error::shader_compile_failed(stage.label(), &log))
    }
}

fn check_link_status(gl: &glow::Context, program: glow::Program) -> Result<(), Error> {
    let status = unsafe { gl.get_program_link_status(program) };
    if !status {
        let log = unsafe { gl.get_program_info_log(program) };
        return Err(Error::shader_link_failed(&log));
    }

    Ok(())
}

fn query_uniforms(
    gl: &glow::Context,
    program: glow::Program,
) -> FxHashMap<String, glow::UniformLocation> {
    let count = unsafe { gl.get_active_uniforms(program) };

    let mut uniforms = FxHashMap::default();
    for index in 0..count {
        let Some(active) = (unsafe { gl.get_active_uniform(program, index) }) else {
            continue;
        };
        // block members have no location
        let Some(location) = (unsafe { gl.get_uniform_location(program, &active.name) }) else {
            continue;
        };

        if let Some(base) = array_base_name(&active.name) {
            uniforms.insert(base.to_string(), location.clone());
        }
        uniforms.insert(active.name, location);
    }

    uniforms
}

fn query_attributes(gl: &glow::Context, program: glow::Program) -> Vec<ActiveAttribute> {
    let count = unsafe { gl.get_active_attributes(program) };

    let mut attributes: Vec<ActiveAttribute> = (0..count)
        .filter_map(|index| unsafe { gl.get_active_attribute(program, index) })
        .filter(|active| !active.name.starts_with("gl_"))
        .filter_map(|active| {
            let location = unsafe { gl.get_attrib_location(program, &active.name) }?;
            Some(ActiveAttribute {
                name: active.name,
                location,
                gl_type: active.atype,
            })
        })
        .collect();

    attributes.sort_by_key(|a| a.location);
    attributes
}

/// `"lights[0]"` -> `Some("lights")`
fn array_base_name(name: &str) -> Option<&str> {
    name.strip_suffix("[0]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::AttributeFormat;

    fn program_with(attributes: Vec<ActiveAttribute>) -> ShaderProgram {
        ShaderProgram {
            program: glow::NativeProgram(std::num::NonZeroU32::MIN),
            uniforms: FxHashMap::default(),
            attributes,
        }
    }

    fn attribute(name: &str, location: u32) -> ActiveAttribute {
        ActiveAttribute {
            name: name.to_string(),
            location,
            gl_type: glow::FLOAT_VEC2,
        }
    }

    #[test]
    fn array_uniforms_are_aliased() {
        assert_eq!(array_base_name("u_weights[0]"), Some("u_weights"));
        assert_eq!(array_base_name("u_time"), None);
    }

    #[test]
    fn layouts_must_cover_active_attributes() {
        let program = program_with(vec![attribute("a_pos", 0), attribute("a_offset", 3)]);

        let per_vertex = VertexLayout::builder()
            .attribute(0, AttributeFormat::float(2))
            .build()
            .unwrap();
        let per_instance = VertexLayout::builder()
            .divisor(1)
            .attribute(3, AttributeFormat::float(2))
            .build()
            .unwrap();

        assert_eq!(
            program.check_layouts(&[&per_vertex]),
            Err(LayoutError::MissingAttribute { name: "a_offset".into(), location: 3 })
        );
        assert_eq!(program.check_layouts(&[&per_vertex, &per_instance]), Ok(()));
        assert_eq!(program.attribute_location("a_offset"), Some(3));
        assert_eq!(program.attribute_location("a_color"), None);
    }

    #[test]
    fn unknown_uniforms_are_errors() {
        let program = program_with(Vec::new());
        assert!(!program.has_uniform("u_mvp"));

        let err = program.uniform_location("u_mvp").unwrap_err();
        assert!(err.to_string().contains("u_mvp"), "{err}");
    }
}
