//! Map view tools for the level editor
//!
//! This crate provides the GL context manager, input and picking, the
//! camera and UV tools, undoable commands over a narrow document model
//! and the compilation context.

pub mod command;
pub mod compilation;
pub mod document;
pub mod error;
pub mod gl_context_manager;
pub mod input;
pub mod pick;
pub mod preferences;
pub mod tool;
pub mod uv;

pub use error::{EditorError, Result};
pub use gl_context_manager::GlContextManager;
pub use input::InputState;
pub use preferences::EditorPreferences;
