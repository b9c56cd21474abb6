use super::Shader;
use crate::core::Color;
use crate::error::{RenderError, Result};
use crate::gl::{GlRef, ProgramId, UniformData, UniformLocation};
use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, info};

/// Values that can be uploaded to a uniform variable
pub trait UniformValue {
    fn to_uniform(&self) -> UniformData;
}

impl UniformValue for bool {
    fn to_uniform(&self) -> UniformData {
        UniformData::Int(i32::from(*self))
    }
}

impl UniformValue for i32 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Int(*self)
    }
}

impl UniformValue for usize {
    fn to_uniform(&self) -> UniformData {
        UniformData::Int(i32::try_from(*self).unwrap_or(i32::MAX))
    }
}

impl UniformValue for f32 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Float(*self)
    }
}

impl UniformValue for Vec2 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Vec2(self.to_array())
    }
}

impl UniformValue for Vec3 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Vec3(self.to_array())
    }
}

impl UniformValue for Vec4 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Vec4(self.to_array())
    }
}

impl UniformValue for Color {
    fn to_uniform(&self) -> UniformData {
        UniformData::Vec4(self.to_array())
    }
}

impl UniformValue for Mat2 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Mat2(self.to_cols_array())
    }
}

impl UniformValue for Mat3 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Mat3(self.to_cols_array())
    }
}

impl UniformValue for Mat4 {
    fn to_uniform(&self) -> UniformData {
        UniformData::Mat4(self.to_cols_array())
    }
}

/// A linked shader program with cached variable locations
///
/// Attaching or detaching a shader marks the program for relinking; the
/// link happens on the next activation and invalidates the location caches.
pub struct ShaderProgram {
    gl: GlRef,
    id: ProgramId,
    name: String,
    shaders: RefCell<Vec<Rc<Shader>>>,
    needs_linking: Cell<bool>,
    attribute_cache: RefCell<HashMap<String, u32>>,
    uniform_cache: RefCell<HashMap<String, UniformLocation>>,
}

impl ShaderProgram {
    pub fn new(gl: &GlRef, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let id = gl
            .create_program()
            .map_err(|_| RenderError::CreateProgram(name.clone()))?;
        info!("Created shader program {name}");
        Ok(Self {
            gl: Rc::clone(gl),
            id,
            name,
            shaders: RefCell::new(Vec::new()),
            needs_linking: Cell::new(true),
            attribute_cache: RefCell::new(HashMap::new()),
            uniform_cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn gl(&self) -> &GlRef {
        &self.gl
    }

    pub fn attach(&self, shader: Rc<Shader>) {
        shader.attach(self.id);
        self.shaders.borrow_mut().push(shader);
        self.needs_linking.set(true);
    }

    pub fn detach(&self, shader: &Shader) {
        shader.detach(self.id);
        self.shaders.borrow_mut().retain(|s| s.id() != shader.id());
        self.needs_linking.set(true);
    }

    pub fn needs_linking(&self) -> bool {
        self.needs_linking.get()
    }

    /// Link if necessary and make this the current program
    pub fn activate(&self) -> Result<()> {
        if self.needs_linking.get() {
            self.link()?;
        }
        self.gl.use_program(Some(self.id));
        Ok(())
    }

    pub fn deactivate(&self) {
        self.gl.use_program(None);
    }

    pub fn is_active(&self) -> bool {
        self.gl.current_program() == Some(self.id)
    }

    pub fn link(&self) -> Result<()> {
        self.gl.link_program(self.id);
        if !self.gl.program_link_status(self.id) {
            let log = self.gl.program_info_log(self.id);
            let log = if log.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                log.trim_end().to_string()
            };
            return Err(RenderError::Link {
                name: self.name.clone(),
                log,
            });
        }
        self.attribute_cache.borrow_mut().clear();
        self.uniform_cache.borrow_mut().clear();
        self.needs_linking.set(false);
        debug!(name = %self.name, "Linked shader program");
        Ok(())
    }

    pub fn enable_attribute(&self, name: &str) -> Result<u32> {
        let location = self.attribute_location(name)?;
        self.gl.enable_vertex_attrib_array(location);
        Ok(location)
    }

    pub fn disable_attribute(&self, name: &str) -> Result<()> {
        let location = self.attribute_location(name)?;
        self.gl.disable_vertex_attrib_array(location);
        Ok(())
    }

    /// Upload a uniform value; the program must be active
    pub fn set<U: UniformValue + ?Sized>(&self, name: &str, value: &U) -> Result<()> {
        let location = self.uniform_location(name)?;
        self.gl.set_uniform(location, value.to_uniform());
        Ok(())
    }

    pub fn attribute_location(&self, name: &str) -> Result<u32> {
        if let Some(location) = self.attribute_cache.borrow().get(name) {
            return Ok(*location);
        }
        let location =
            self.gl
                .attrib_location(self.id, name)
                .ok_or_else(|| RenderError::MissingAttribute {
                    attribute: name.to_string(),
                    program: self.name.clone(),
                })?;
        self.attribute_cache
            .borrow_mut()
            .insert(name.to_string(), location);
        Ok(location)
    }

    pub fn uniform_location(&self, name: &str) -> Result<UniformLocation> {
        if let Some(location) = self.uniform_cache.borrow().get(name) {
            return Ok(*location);
        }
        let location =
            self.gl
                .uniform_location(self.id, name)
                .ok_or_else(|| RenderError::MissingUniform {
                    uniform: name.to_string(),
                    program: self.name.clone(),
                })?;
        self.uniform_cache
            .borrow_mut()
            .insert(name.to_string(), location);
        Ok(location)
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        for shader in self.shaders.borrow().iter() {
            shader.detach(self.id);
        }
        self.gl.delete_program(self.id);
    }
}

impl std::fmt::Debug for ShaderProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{GlCall, RecordingGl, ShaderKind};

    const VERTEX: &str = "uniform mat4 u_model;\nin vec3 a_position;\nvoid main() {}";
    const FRAGMENT: &str = "uniform vec4 u_color;\nvoid main() {}";

    fn program(recording: &Rc<RecordingGl>) -> ShaderProgram {
        let gl: GlRef = recording.clone();
        let program = ShaderProgram::new(&gl, "Test").unwrap();
        program.attach(Rc::new(
            Shader::from_source(&gl, "Test.vertsh", ShaderKind::Vertex, VERTEX).unwrap(),
        ));
        program.attach(Rc::new(
            Shader::from_source(&gl, "Test.fragsh", ShaderKind::Fragment, FRAGMENT).unwrap(),
        ));
        program
    }

    fn lookups(recording: &RecordingGl, name: &str) -> usize {
        recording
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::GetUniformLocation(_, n) if n == name))
            .count()
    }

    #[test]
    fn test_activate_links_once() {
        let recording = Rc::new(RecordingGl::new());
        let program = program(&recording);
        assert!(program.needs_linking());
        program.activate().unwrap();
        program.activate().unwrap();
        let links = recording
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::LinkProgram(_)))
            .count();
        assert_eq!(links, 1);
        assert!(program.is_active());
        program.deactivate();
        assert!(!program.is_active());
    }

    #[test]
    fn test_uniform_location_is_cached() {
        let recording = Rc::new(RecordingGl::new());
        let program = program(&recording);
        program.activate().unwrap();
        program.set("u_color", &Color::RED).unwrap();
        program.set("u_color", &Color::GREEN).unwrap();
        assert_eq!(lookups(&recording, "u_color"), 1);
        assert_eq!(
            recording.uniform_value(program.id(), "u_color"),
            Some(UniformData::Vec4([0.0, 1.0, 0.0, 1.0]))
        );
    }

    #[test]
    fn test_relink_clears_caches() {
        let recording = Rc::new(RecordingGl::new());
        let program = program(&recording);
        program.activate().unwrap();
        program.set("u_model", &Mat4::IDENTITY).unwrap();
        program.link().unwrap();
        program.set("u_model", &Mat4::IDENTITY).unwrap();
        assert_eq!(lookups(&recording, "u_model"), 2);
    }

    #[test]
    fn test_missing_locations() {
        let recording = Rc::new(RecordingGl::new());
        let program = program(&recording);
        program.activate().unwrap();
        let err = program.set("u_nothing", &1.0f32).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Location of uniform variable 'u_nothing' could not be found in shader program Test"
        );
        let err = program.enable_attribute("a_nothing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Location of attribute 'a_nothing' could not be found in shader program Test"
        );
        assert_eq!(program.enable_attribute("a_position").unwrap(), 0);
    }

    #[test]
    fn test_link_failure_message() {
        let recording = Rc::new(RecordingGl::new());
        let program = program(&recording);
        recording.fail_link(Some(""));
        let err = program.activate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not link shader program Test: Unknown error"
        );
        assert!(program.needs_linking());
    }

    #[test]
    fn test_bool_and_usize_are_ints() {
        assert_eq!(true.to_uniform(), UniformData::Int(1));
        assert_eq!(3usize.to_uniform(), UniformData::Int(3));
    }
}
