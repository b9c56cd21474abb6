//! Per-frame render state and batching

mod batch;
mod context;
mod state;

pub use batch::{RenderBatch, Renderable};
pub use context::RenderContext;
pub use state::{RenderMode, RenderState, SelectionGuide};
