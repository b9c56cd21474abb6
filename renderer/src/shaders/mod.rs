//! Shader loading and program management
//!
//! GLSL sources live in the crate's `shaders/` directory. Each
//! [`ShaderConfig`] names a program and the files it is built from;
//! the [`ShaderManager`] turns configurations into linked programs.

mod active;
mod manager;
mod program;
mod shader;

pub use active::ActiveShader;
pub use manager::{ProgramSlot, ShaderManager};
pub use program::{ShaderProgram, UniformValue};
pub use shader::Shader;

use std::path::PathBuf;

/// A named program and the shader files it links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderConfig {
    pub name: &'static str,
    pub vertex_shaders: &'static [&'static str],
    pub fragment_shaders: &'static [&'static str],
}

impl ShaderConfig {
    pub const fn new(
        name: &'static str,
        vertex_shaders: &'static [&'static str],
        fragment_shaders: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            vertex_shaders,
            fragment_shaders,
        }
    }
}

pub const EDGE: ShaderConfig = ShaderConfig::new("Edge", &["Edge.vertsh"], &["VaryingPC.fragsh"]);

pub const COMPASS: ShaderConfig =
    ShaderConfig::new("Compass", &["Compass.vertsh"], &["Compass.fragsh"]);

pub const COMPASS_OUTLINE: ShaderConfig = ShaderConfig::new(
    "Compass Outline",
    &["CompassOutline.vertsh"],
    &["UniformColor.fragsh"],
);

pub const COMPASS_BACKGROUND: ShaderConfig = ShaderConfig::new(
    "Compass Background",
    &["UniformColor.vertsh"],
    &["UniformColor.fragsh"],
);

pub const COLORED_TEXT: ShaderConfig = ShaderConfig::new(
    "Colored Text",
    &["ColoredText.vertsh"],
    &["ColoredText.fragsh"],
);

pub const TEXT_BACKGROUND: ShaderConfig = ShaderConfig::new(
    "Text Background",
    &["TextBackground.vertsh"],
    &["VaryingPC.fragsh"],
);

pub const HANDLE: ShaderConfig =
    ShaderConfig::new("Handle", &["UniformColor.vertsh"], &["UniformColor.fragsh"]);

pub const ALL: [ShaderConfig; 7] = [
    EDGE,
    COMPASS,
    COMPASS_OUTLINE,
    COMPASS_BACKGROUND,
    COLORED_TEXT,
    TEXT_BACKGROUND,
    HANDLE,
];

/// Directory holding the GLSL sources shipped with this crate
pub fn default_shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_shader_files_exist() {
        let dir = default_shader_dir();
        for config in ALL {
            for file in config.vertex_shaders.iter().chain(config.fragment_shaders) {
                assert!(dir.join(file).is_file(), "missing {file} for {}", config.name);
            }
        }
    }
}
