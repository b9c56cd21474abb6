//! Owns the render context shared by all map views of a window

use crate::error::Result;
use once_cell::sync::Lazy;
use renderer::config::RenderConfig;
use renderer::gl::{GlRef, StringName};
use renderer::render::RenderContext;
use renderer::widgets::FontFactory;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Driver strings of the most recently initialised context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
}

impl Default for GlInfo {
    fn default() -> Self {
        Self {
            vendor: UNKNOWN.to_string(),
            renderer: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
        }
    }
}

static GL_INFO: Lazy<RwLock<GlInfo>> = Lazy::new(|| RwLock::new(GlInfo::default()));

const UNKNOWN: &str = "unknown";

pub fn gl_info() -> GlInfo {
    GL_INFO
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn gl_vendor() -> String {
    gl_info().vendor
}

pub fn gl_renderer() -> String {
    gl_info().renderer
}

pub fn gl_version() -> String {
    gl_info().version
}

pub struct GlContextManager {
    initialized: bool,
    render_context: RenderContext,
}

impl GlContextManager {
    pub fn new(gl: GlRef, config: RenderConfig, fonts: Box<dyn FontFactory>) -> Self {
        Self {
            initialized: false,
            render_context: RenderContext::new(gl, config, fonts),
        }
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Read the driver strings on first use
    ///
    /// Returns `true` only for the call that performed the initialisation.
    /// The process-wide strings always reflect the last initialised context.
    pub fn initialize(&mut self) -> Result<bool> {
        if self.initialized {
            return Ok(false);
        }
        let gl = self.render_context.gl();
        let info = GlInfo {
            vendor: gl.get_string(StringName::Vendor),
            renderer: gl.get_string(StringName::Renderer),
            version: gl.get_string(StringName::Version),
        };
        gl.check_errors()?;

        info!(
            vendor = %info.vendor,
            renderer = %info.renderer,
            version = %info.version,
            "Initialized OpenGL context"
        );
        let mut current = GL_INFO.write().unwrap_or_else(PoisonError::into_inner);
        if *current != info {
            debug!(previous = %current.vendor, "Replacing recorded OpenGL driver strings");
        }
        *current = info;
        self.initialized = true;
        Ok(true)
    }

    pub fn render_context(&self) -> &RenderContext {
        &self.render_context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use renderer::gl::RecordingGl;
    use renderer::widgets::GridFontFactory;
    use std::rc::Rc;

    fn manager_for(recording: &Rc<RecordingGl>) -> GlContextManager {
        GlContextManager::new(
            recording.clone(),
            RenderConfig::default(),
            Box::new(GridFontFactory),
        )
    }

    // One test so that parallel tests never race on the process-wide strings
    #[test]
    fn test_initialize_once_and_record_latest_driver() {
        let recording = Rc::new(RecordingGl::new());
        let mut manager = manager_for(&recording);
        assert!(!manager.initialized());
        assert!(manager.initialize().unwrap());
        assert!(manager.initialized());
        assert!(!manager.initialize().unwrap());
        assert_eq!(gl_vendor(), "Recording");
        assert_eq!(gl_version(), "3.3 (recorded)");

        let other = Rc::new(RecordingGl::new());
        other.set_string(StringName::Vendor, "Other Vendor");
        other.set_string(StringName::Renderer, "Other Renderer");
        let mut second = manager_for(&other);
        assert!(second.initialize().unwrap());
        assert_eq!(gl_vendor(), "Other Vendor");
        assert_eq!(gl_renderer(), "Other Renderer");
        assert_eq!(gl_version(), "3.3 (recorded)");
    }

    #[test]
    fn test_initialize_reports_gl_errors() {
        let recording = Rc::new(RecordingGl::new());
        recording.push_debug_error(1281, "GL_INVALID_VALUE");
        let mut manager = manager_for(&recording);
        assert!(manager.initialize().is_err());
        assert!(!manager.initialized());
    }
}
