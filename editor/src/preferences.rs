//! Editor preferences
//!
//! Camera navigation speeds, UV tool tolerances and command collation,
//! persisted as JSON next to the render config.

use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorPreferences {
    #[serde(default)]
    pub camera: CameraPreferences,

    #[serde(default)]
    pub uv: UvPreferences,

    /// Commands of the same kind submitted within this many milliseconds
    /// are merged into one undo step
    #[serde(default = "default_collation_interval")]
    pub command_collation_interval_ms: u64,

    /// Preferences version for future migration support
    #[serde(default)]
    pub version: u32,
}

fn default_collation_interval() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPreferences {
    pub look_speed: f32,
    pub look_invert_h: bool,
    pub look_invert_v: bool,
    pub pan_speed: f32,
    pub pan_invert_h: bool,
    pub pan_invert_v: bool,
    pub move_speed: f32,
    /// Reverses alt+middle drag movement
    pub alt_move_invert: bool,
    pub mouse_wheel_invert: bool,
    /// Scroll towards the cursor instead of along the view direction
    pub move_in_cursor_dir: bool,
    /// Orbit distance used when nothing is under the cursor
    pub orbit_default_distance: f32,
}

impl Default for CameraPreferences {
    fn default() -> Self {
        Self {
            look_speed: 0.5,
            look_invert_h: false,
            look_invert_v: false,
            pan_speed: 0.5,
            pan_invert_h: false,
            pan_invert_v: false,
            move_speed: 0.3,
            alt_move_invert: false,
            mouse_wheel_invert: false,
            move_in_cursor_dir: false,
            orbit_default_distance: 256.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UvPreferences {
    /// Radius of the rotation ring in pixels
    pub rotate_handle_radius: f32,
    /// Pick tolerance around the rotation ring in pixels
    pub rotate_handle_width: f32,
    /// Rotation snaps to multiples of this angle, in degrees
    pub rotate_snap_step: f32,
    pub rotate_snap_tolerance: f32,
    /// Pick tolerance around texture boundary lines in pixels
    pub scale_handle_width: f32,
    /// Dragged scale handles snap to face vertices within this many pixels
    pub vertex_snap_distance: f32,
}

impl Default for UvPreferences {
    fn default() -> Self {
        Self {
            rotate_handle_radius: 32.0,
            rotate_handle_width: 5.0,
            rotate_snap_step: 15.0,
            rotate_snap_tolerance: 3.0,
            scale_handle_width: 4.0,
            vertex_snap_distance: 4.0,
        }
    }
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            camera: CameraPreferences::default(),
            uv: UvPreferences::default(),
            command_collation_interval_ms: default_collation_interval(),
            version: 1,
        }
    }
}

impl EditorPreferences {
    /// Get the default path for the preferences file
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("editor_preferences.json")
    }

    pub fn collation_interval(&self) -> Duration {
        Duration::from_millis(self.command_collation_interval_ms)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| EditorError::Preferences {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        info!("Saved editor preferences to {:?}", path.as_ref());
        Ok(())
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|source| EditorError::Preferences {
                path: path.as_ref().to_path_buf(),
                source,
            })?;
        let preferences = serde_json::from_str(&content)?;
        info!("Loaded editor preferences from {:?}", path.as_ref());
        Ok(preferences)
    }

    /// Load from `path`, falling back to defaults if it is missing or invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        if !path.as_ref().exists() {
            info!("No preferences file found, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("Failed to parse preferences file: {}. Using defaults.", e);
                Self::default()
            }
        }
    }
}
