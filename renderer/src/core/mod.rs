//! Core math types
//!
//! Camera, transformation stacks and the small geometric value types the
//! renderer and the editing tools exchange.

pub mod bounds;
pub mod camera;
pub mod color;
pub mod transformation;

pub use bounds::{BBox3, Ray3};
pub use camera::{Camera, ProjectionMode, Viewport};
pub use color::Color;
pub use transformation::Transformation;
