//! OpenGL rendering layer for the map editor
//!
//! This crate wraps the GL context behind the [`gl::OpenGl`] trait and
//! provides shader management, vertex buffers, transformation stacks, a
//! camera and the view widgets (compass, labels, edges) the editor draws.

pub mod config;
pub mod core;
pub mod error;
pub mod gl;
pub mod graphics;
pub mod render;
pub mod shaders;
pub mod widgets;

pub use error::{RenderError, Result};

// Re-export commonly used types
pub mod prelude {
    pub use crate::core::{BBox3, Camera, Color, ProjectionMode, Ray3, Transformation, Viewport};

    pub use glam::{Mat4, Vec2, Vec3, Vec4};

    pub use crate::gl::{GlRef, GlowContext, OpenGl, RecordingGl};

    pub use crate::graphics::{IndexArray, PrimType, VboManager, VertexArray};

    pub use crate::shaders::{ActiveShader, ShaderConfig, ShaderManager, ShaderProgram};

    pub use crate::render::{RenderBatch, RenderContext, RenderMode, RenderState, Renderable};

    pub use crate::widgets::{Compass, CompassKind, DirectEdgeRenderer, TextRenderer};

    pub use crate::config::RenderConfig;
    pub use crate::error::{RenderError, Result};
}

/// Initialize logging for the renderer and the tools built on it
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
