//! The UV editor: texture placement on the selected faces
//!
//! The view shows one face head-on through an orthographic camera. The
//! [`UvViewHelper`] converts between world, face and texture coordinates;
//! the tools drag handles to rotate or scale the texture of every
//! selected face.

mod rotate_tool;
mod scale_tool;
mod view_helper;

pub use rotate_tool::{UvRotateTool, ANGLE_HANDLE_HIT_TYPE};
pub use scale_tool::{UvScaleTool, X_HANDLE_HIT_TYPE, Y_HANDLE_HIT_TYPE};
pub use view_helper::UvViewHelper;
