use super::{Shader, ShaderConfig, ShaderProgram};
use crate::error::Result;
use crate::gl::{GlRef, ShaderKind};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

/// The program currently activated through an [`super::ActiveShader`]
pub type ProgramSlot = Rc<RefCell<Option<Rc<ShaderProgram>>>>;

/// Creates programs on demand and caches them per configuration
///
/// Compiled shaders are cached per file so configurations sharing a file
/// compile it only once.
pub struct ShaderManager {
    gl: GlRef,
    shader_dir: PathBuf,
    programs: RefCell<HashMap<&'static str, Rc<ShaderProgram>>>,
    shaders: RefCell<HashMap<String, Rc<Shader>>>,
    current: ProgramSlot,
}

impl ShaderManager {
    pub fn new(gl: GlRef, shader_dir: impl Into<PathBuf>) -> Self {
        Self {
            gl,
            shader_dir: shader_dir.into(),
            programs: RefCell::new(HashMap::new()),
            shaders: RefCell::new(HashMap::new()),
            current: Rc::new(RefCell::new(None)),
        }
    }

    pub fn shader_dir(&self) -> &Path {
        &self.shader_dir
    }

    /// The program for `config`, created and linked on first use
    pub fn program(&self, config: &ShaderConfig) -> Result<Rc<ShaderProgram>> {
        if let Some(program) = self.programs.borrow().get(config.name) {
            return Ok(Rc::clone(program));
        }

        debug!(name = config.name, "Creating shader program");
        let program = ShaderProgram::new(&self.gl, config.name)?;
        for file in config.vertex_shaders {
            program.attach(self.shader(file, ShaderKind::Vertex)?);
        }
        for file in config.fragment_shaders {
            program.attach(self.shader(file, ShaderKind::Fragment)?);
        }
        program.link()?;

        let program = Rc::new(program);
        self.programs
            .borrow_mut()
            .insert(config.name, Rc::clone(&program));
        Ok(program)
    }

    fn shader(&self, file: &str, kind: ShaderKind) -> Result<Rc<Shader>> {
        if let Some(shader) = self.shaders.borrow().get(file) {
            return Ok(Rc::clone(shader));
        }
        let shader = Rc::new(Shader::load(&self.gl, &self.shader_dir.join(file), kind)?);
        self.shaders
            .borrow_mut()
            .insert(file.to_string(), Rc::clone(&shader));
        Ok(shader)
    }

    pub fn current_program(&self) -> Option<Rc<ShaderProgram>> {
        self.current.borrow().clone()
    }

    pub(crate) fn set_current_program(&self, program: Option<Rc<ShaderProgram>>) {
        *self.current.borrow_mut() = program;
    }

    pub(crate) fn slot(&self) -> ProgramSlot {
        Rc::clone(&self.current)
    }

    pub fn program_count(&self) -> usize {
        self.programs.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{GlCall, RecordingGl};
    use crate::shaders;

    fn manager() -> (Rc<RecordingGl>, ShaderManager) {
        let recording = Rc::new(RecordingGl::new());
        let manager = ShaderManager::new(recording.clone(), shaders::default_shader_dir());
        (recording, manager)
    }

    #[test]
    fn test_programs_are_cached() {
        let (_, manager) = manager();
        let a = manager.program(&shaders::EDGE).unwrap();
        let b = manager.program(&shaders::EDGE).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(manager.program_count(), 1);
    }

    #[test]
    fn test_shared_shader_files_compile_once() {
        let (recording, manager) = manager();
        manager.program(&shaders::COMPASS_BACKGROUND).unwrap();
        manager.program(&shaders::HANDLE).unwrap();
        let compiles = recording
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::CompileShader(_)))
            .count();
        assert_eq!(compiles, 2);
    }

    #[test]
    fn test_missing_shader_dir() {
        let recording = Rc::new(RecordingGl::new());
        let manager = ShaderManager::new(recording, "/nonexistent");
        let err = manager.program(&shaders::EDGE).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Could not load shader source from /nonexistent/"));
        assert!(manager.current_program().is_none());
    }
}
