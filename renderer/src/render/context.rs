use crate::config::RenderConfig;
use crate::gl::GlRef;
use crate::graphics::VboManager;
use crate::shaders::ShaderManager;
use crate::widgets::{FontFactory, FontManager};
use std::rc::Rc;

/// Long-lived rendering resources shared by all views of a window
pub struct RenderContext {
    gl: GlRef,
    config: RenderConfig,
    shader_manager: ShaderManager,
    vbo_manager: VboManager,
    font_manager: FontManager,
}

impl RenderContext {
    pub fn new(gl: GlRef, config: RenderConfig, font_factory: Box<dyn FontFactory>) -> Self {
        Self {
            shader_manager: ShaderManager::new(Rc::clone(&gl), config.shader_dir.clone()),
            vbo_manager: VboManager::new(Rc::clone(&gl)),
            font_manager: FontManager::new(Rc::clone(&gl), font_factory),
            config,
            gl,
        }
    }

    pub fn gl(&self) -> &GlRef {
        &self.gl
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn shader_manager(&self) -> &ShaderManager {
        &self.shader_manager
    }

    pub fn vbo_manager(&self) -> &VboManager {
        &self.vbo_manager
    }

    pub fn font_manager(&self) -> &FontManager {
        &self.font_manager
    }
}
