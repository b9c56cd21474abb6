//! Vertex data, buffer objects and draw helpers

mod index_range;
mod prim_type;
pub mod render_utils;
mod vbo;
mod vertex;
mod vertex_array;

pub use index_range::{IndexRangeMap, IndexRangeMapBuilder, IndexRangeMapSize, IndexRangeRenderer};
pub use prim_type::PrimType;
pub use vbo::{Vbo, VboManager, VboStats};
pub use vertex::{
    AttributeKind, GlVertex, VertexAttribute, VertexP2, VertexP3, VertexP3C4, VertexP3N,
    VertexP3T2C4,
};
pub use vertex_array::{IndexArray, VertexArray};
