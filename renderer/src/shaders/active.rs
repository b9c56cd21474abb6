use super::{ProgramSlot, ShaderConfig, ShaderManager, ShaderProgram, UniformValue};
use crate::core::Transformation;
use crate::error::Result;
use std::rc::Rc;

/// Keeps a program active for as long as it is alive
///
/// Creating an `ActiveShader` activates the program, registers it as the
/// manager's current program and uploads `u_projection`, `u_view` and
/// `u_model` from the transformation. Dropping it deactivates the program.
pub struct ActiveShader {
    program: Rc<ShaderProgram>,
    slot: ProgramSlot,
}

impl ActiveShader {
    pub fn new(
        manager: &ShaderManager,
        transformation: &Transformation,
        config: &ShaderConfig,
    ) -> Result<Self> {
        let program = manager.program(config)?;
        program.activate()?;
        manager.set_current_program(Some(Rc::clone(&program)));

        let active = Self {
            program,
            slot: manager.slot(),
        };
        active.set("u_projection", transformation.projection())?;
        active.set("u_view", transformation.view())?;
        active.apply_model_transform(transformation)?;
        Ok(active)
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn set<U: UniformValue + ?Sized>(&self, name: &str, value: &U) -> Result<()> {
        self.program.set(name, value)
    }

    /// Upload the top of the model stack
    pub fn apply_model_transform(&self, transformation: &Transformation) -> Result<()> {
        self.program.set("u_model", transformation.model())
    }
}

impl Drop for ActiveShader {
    fn drop(&mut self) {
        self.program.deactivate();
        self.slot.borrow_mut().take();
    }
}
