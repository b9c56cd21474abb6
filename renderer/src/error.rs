//! Error type shared by every rendering operation
//!
//! All failures are treated as fatal to the operation that raised them and
//! are handed back to the caller with a diagnostic message.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors raised while creating or using GL resources
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Cannot create shader program {0}")]
    CreateProgram(String),

    #[error("Could not create shader {0}")]
    CreateShader(String),

    #[error("Could not compile shader {name}: {log}")]
    Compile { name: String, log: String },

    #[error("Could not link shader program {name}: {log}")]
    Link { name: String, log: String },

    #[error("Location of attribute '{attribute}' could not be found in shader program {program}")]
    MissingAttribute { attribute: String, program: String },

    #[error("Location of uniform variable '{uniform}' could not be found in shader program {program}")]
    MissingUniform { uniform: String, program: String },

    #[error("Could not load shader source from {}", path.display())]
    ShaderSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown shader type for {}", .0.display())]
    UnknownShaderType(PathBuf),

    #[error("Unknown GL enum: {0}")]
    UnknownEnum(String),

    #[error("OpenGL error: {id} ({message})")]
    GlDebug { id: u32, message: String },

    #[error("Could not create buffer object: {0}")]
    CreateBuffer(String),

    #[error("Could not create texture: {0}")]
    CreateTexture(String),

    #[error("Buffer write of {len} bytes at offset {offset} exceeds capacity {capacity}")]
    BufferOverflow {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    #[error("Must have a program bound to use vertex attributes")]
    NoActiveProgram,

    #[error("Vertex data must be prepared before rendering")]
    NotPrepared,

    #[error("Could not create font {0}")]
    Font(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_message() {
        let err = RenderError::Compile {
            name: "Edge.vertsh".to_string(),
            log: "0:3: syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not compile shader Edge.vertsh: 0:3: syntax error"
        );
    }

    #[test]
    fn test_missing_uniform_message() {
        let err = RenderError::MissingUniform {
            uniform: "u_color".to_string(),
            program: "Edge".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Location of uniform variable 'u_color' could not be found in shader program Edge"
        );
    }

    #[test]
    fn test_gl_debug_message() {
        let err = RenderError::GlDebug {
            id: 1282,
            message: "invalid operation".to_string(),
        };
        assert_eq!(err.to_string(), "OpenGL error: 1282 (invalid operation)");
    }
}
