use crate::error::{RenderError, Result};
use crate::gl::{GlRef, ProgramId, ShaderId, ShaderKind};
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, info};

/// A compiled shader object, deleted on drop
pub struct Shader {
    gl: GlRef,
    id: ShaderId,
    name: String,
    kind: ShaderKind,
}

impl Shader {
    /// Load and compile the shader source at `path`
    ///
    /// The shader is named after the last component of the path.
    pub fn load(gl: &GlRef, path: &Path, kind: ShaderKind) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::ShaderSource {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loading shader {name}");
        Self::from_source(gl, name, kind, &source)
    }

    pub fn from_source(
        gl: &GlRef,
        name: impl Into<String>,
        kind: ShaderKind,
        source: &str,
    ) -> Result<Self> {
        let name = name.into();
        let id = gl.create_shader(kind).map_err(|e| match e {
            RenderError::CreateShader(reason) => {
                RenderError::CreateShader(format!("{name}: {reason}"))
            }
            other => other,
        })?;
        // Wrap before compiling so a failed shader is deleted on return
        let shader = Self {
            gl: Rc::clone(gl),
            id,
            name,
            kind,
        };

        gl.shader_source(id, source);
        gl.compile_shader(id);
        if !gl.shader_compile_status(id) {
            let log = gl.shader_info_log(id);
            let log = if log.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                log.trim_end().to_string()
            };
            return Err(RenderError::Compile {
                name: shader.name.clone(),
                log,
            });
        }
        debug!(name = %shader.name, ?kind, "Compiled shader");
        Ok(shader)
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn attach(&self, program: ProgramId) {
        self.gl.attach_shader(program, self.id);
    }

    pub fn detach(&self, program: ProgramId) {
        self.gl.detach_shader(program, self.id);
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.gl.delete_shader(self.id);
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::RecordingGl;
    use std::io::Write;

    fn gl() -> (Rc<RecordingGl>, GlRef) {
        let recording = Rc::new(RecordingGl::new());
        let gl: GlRef = recording.clone();
        (recording, gl)
    }

    #[test]
    fn test_load_from_file() {
        let (_, gl) = gl();
        let mut file = tempfile::Builder::new().suffix(".vertsh").tempfile().unwrap();
        writeln!(file, "#version 330 core\nvoid main() {{}}").unwrap();
        let shader = Shader::load(&gl, file.path(), ShaderKind::Vertex).unwrap();
        assert!(shader.name().ends_with(".vertsh"));
    }

    #[test]
    fn test_missing_file() {
        let (_, gl) = gl();
        let err = Shader::load(&gl, Path::new("/nonexistent/Edge.vertsh"), ShaderKind::Vertex)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not load shader source from /nonexistent/Edge.vertsh"
        );
    }

    #[test]
    fn test_compile_error_deletes_shader() {
        let (recording, gl) = gl();
        let err = Shader::from_source(&gl, "Bad.fragsh", ShaderKind::Fragment, "COMPILE_ERROR")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not compile shader Bad.fragsh: 0:1: error: COMPILE_ERROR"
        );
        assert_eq!(recording.live_shaders(), 0);
    }

    #[test]
    fn test_compile_error_without_log() {
        let (_, gl) = gl();
        let err = Shader::from_source(
            &gl,
            "Quiet.fragsh",
            ShaderKind::Fragment,
            "COMPILE_ERROR_SILENT",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not compile shader Quiet.fragsh: Unknown error"
        );
    }
}
