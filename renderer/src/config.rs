//! Renderer configuration
//!
//! Colours, text rendering parameters, the default font and the shader
//! directory, persisted as JSON.

use crate::core::Color;
use crate::error::Result;
use crate::gl::BlendFactor;
use crate::widgets::FontDescriptor;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Directory holding the `.vertsh` / `.fragsh` sources
    #[serde(default = "crate::shaders::default_shader_dir")]
    pub shader_dir: PathBuf,

    #[serde(default)]
    pub colors: ColorConfig,

    #[serde(default)]
    pub text: TextConfig,

    /// Font used for labels unless a renderer asks for another one
    #[serde(default)]
    pub font: FontDescriptor,

    /// Config version for future migration support
    #[serde(default)]
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub x_axis: Color,
    pub y_axis: Color,
    pub z_axis: Color,
    pub compass_background: Color,
    pub compass_background_outline: Color,
    pub compass_axis_outline: Color,
    pub edge: Color,
    pub selected_edge: Color,
    pub soft_map_bounds: Color,
    pub selection_bounds: Color,
    pub info_overlay_text: Color,
    pub info_overlay_background: Color,
}

/// Parameters of the label renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Labels further away than this are hidden in 3D views
    pub max_view_distance: f32,
    /// Labels are hidden in 2D views below this zoom factor
    pub min_zoom_factor: f32,
    /// Padding between the text and its background
    pub inset: Vec2,
    pub corner_radius: f32,
    pub corner_segments: usize,
    pub blend_src: BlendFactor,
    pub blend_dst: BlendFactor,
}

fn rgb(r: u8, g: u8, b: u8, a: f32) -> Color {
    Color::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        a,
    )
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            x_axis: rgb(0xFF, 0x3D, 0x00, 0.7),
            y_axis: rgb(0x4B, 0x95, 0x00, 0.7),
            z_axis: rgb(0x10, 0x9C, 0xFF, 0.7),
            compass_background: Color::new(0.5, 0.5, 0.5, 0.5),
            compass_background_outline: Color::new(1.0, 1.0, 1.0, 0.5),
            compass_axis_outline: Color::WHITE,
            edge: Color::new(0.7, 0.7, 0.7, 1.0),
            selected_edge: Color::new(1.0, 0.0, 0.0, 1.0),
            soft_map_bounds: rgb(241, 125, 37, 0.33),
            selection_bounds: Color::new(1.0, 0.0, 0.0, 0.5),
            info_overlay_text: Color::WHITE,
            info_overlay_background: Color::new(0.0, 0.0, 0.0, 0.6),
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_view_distance: 768.0,
            min_zoom_factor: 0.5,
            inset: Vec2::new(4.0, 4.0),
            corner_radius: 3.0,
            corner_segments: 3,
            blend_src: BlendFactor::SrcAlpha,
            blend_dst: BlendFactor::OneMinusSrcAlpha,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shader_dir: crate::shaders::default_shader_dir(),
            colors: ColorConfig::default(),
            text: TextConfig::default(),
            font: FontDescriptor::default(),
            version: 1,
        }
    }
}

impl RenderConfig {
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        info!("Saved render config to {:?}", path.as_ref());
        Ok(())
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content)?;
        info!("Loaded render config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults if it is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        if !path.as_ref().exists() {
            info!("No render config found, using defaults");
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("Failed to load render config: {}. Using defaults.", e);
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_text_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.text.max_view_distance, 768.0);
        assert_eq!(config.text.min_zoom_factor, 0.5);
        assert_eq!(config.text.inset, Vec2::new(4.0, 4.0));
        assert!(config.shader_dir.ends_with("shaders"));
    }

    #[test]
    fn test_save_load_config() {
        let mut config = RenderConfig::default();
        config.text.max_view_distance = 1024.0;
        config.text.blend_dst = BlendFactor::One;
        config.colors.x_axis = Color::RED;

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        config.save_to(temp_file.path()).expect("Failed to save config");
        let loaded = RenderConfig::load_from(temp_file.path()).expect("Failed to load config");

        assert_eq!(loaded.text.max_view_distance, 1024.0);
        assert_eq!(loaded.text.blend_dst, BlendFactor::One);
        assert_eq!(loaded.colors.x_axis, Color::RED);
    }

    #[test]
    fn test_blend_factors_are_enum_names() {
        let json = serde_json::to_string(&TextConfig::default()).unwrap();
        assert!(json.contains("\"GL_SRC_ALPHA\""));
        assert!(json.contains("\"GL_ONE_MINUS_SRC_ALPHA\""));
    }

    #[test]
    fn test_partial_and_invalid_files() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        std::fs::write(temp_file.path(), r#"{ "text": { "min_zoom_factor": 0.25 } }"#).unwrap();
        let loaded = RenderConfig::load_from(temp_file.path()).unwrap();
        assert_eq!(loaded.text.min_zoom_factor, 0.25);
        assert_eq!(loaded.text.max_view_distance, 768.0);

        std::fs::write(temp_file.path(), r#"{ "text": { "blend_src": "GL_WHAT" } }"#).unwrap();
        assert!(RenderConfig::load_from(temp_file.path()).is_err());
        let fallback = RenderConfig::load_or_default(temp_file.path());
        assert_eq!(fallback.text.blend_src, BlendFactor::SrcAlpha);
    }
}
