//! Edge rendering
//!
//! Edges are drawn with the Edge shader in a one-shot batch entry that
//! applies line width, depth offset and depth test changes around the
//! draw and restores them afterwards.

use crate::core::Color;
use crate::error::Result;
use crate::gl::Capability;
use crate::graphics::{render_utils, IndexArray, IndexRangeMap, PrimType, VboManager, VertexArray};
use crate::render::{RenderBatch, RenderState, Renderable};
use crate::shaders::{self, ActiveShader};
use glam::Vec3;
use std::cell::RefCell;
use std::rc::Rc;

/// Alpha of the tint applied to edges outside the soft map bounds
const SOFT_MAP_BOUNDS_ALPHA: f32 = 0.33;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    pub width: f32,
    /// Depth range reduction pulling edges in front of coplanar faces
    pub offset: f32,
    pub on_top: bool,
    /// Overrides the per-vertex colours when set
    pub color: Option<Color>,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            offset: 0.0,
            on_top: false,
            color: None,
        }
    }
}

impl EdgeParams {
    pub fn new(width: f32, offset: f32, on_top: bool) -> Self {
        Self {
            width,
            offset,
            on_top,
            color: None,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Queues edge passes into a render batch
pub trait EdgeRenderer {
    fn render_with(&self, batch: &mut RenderBatch, params: EdgeParams);

    fn render(&self, batch: &mut RenderBatch, width: f32, offset: f32) {
        self.render_with(batch, EdgeParams::new(width, offset, false));
    }

    fn render_colored(&self, batch: &mut RenderBatch, color: Color, width: f32, offset: f32) {
        self.render_with(batch, EdgeParams::new(width, offset, false).with_color(color));
    }

    fn render_on_top(&self, batch: &mut RenderBatch, width: f32, offset: f32) {
        self.render_with(batch, EdgeParams::new(width, offset, true));
    }

    fn render_on_top_colored(
        &self,
        batch: &mut RenderBatch,
        color: Color,
        width: f32,
        offset: f32,
    ) {
        self.render_with(batch, EdgeParams::new(width, offset, true).with_color(color));
    }
}

/// Draws ranges of a vertex array it shares with its queued passes
pub struct DirectEdgeRenderer {
    vertex_array: Rc<RefCell<VertexArray>>,
    ranges: IndexRangeMap,
}

impl DirectEdgeRenderer {
    /// Draw the whole array as primitives of type `prim`
    pub fn new(vertex_array: VertexArray, prim: PrimType) -> Self {
        let ranges = IndexRangeMap::single(prim, 0, vertex_array.vertex_count());
        Self::with_ranges(vertex_array, ranges)
    }

    pub fn with_ranges(vertex_array: VertexArray, ranges: IndexRangeMap) -> Self {
        Self {
            vertex_array: Rc::new(RefCell::new(vertex_array)),
            ranges,
        }
    }
}

impl EdgeRenderer for DirectEdgeRenderer {
    fn render_with(&self, batch: &mut RenderBatch, params: EdgeParams) {
        batch.add_one_shot(Box::new(RenderEdges {
            vertex_array: Rc::clone(&self.vertex_array),
            source: EdgeSource::Ranges(self.ranges.clone()),
            params,
        }));
    }
}

/// Draws a vertex array as lines through an index array
pub struct IndexedEdgeRenderer {
    vertex_array: Rc<RefCell<VertexArray>>,
    indices: Rc<RefCell<IndexArray>>,
}

impl IndexedEdgeRenderer {
    pub fn new(vertex_array: VertexArray, indices: IndexArray) -> Self {
        Self {
            vertex_array: Rc::new(RefCell::new(vertex_array)),
            indices: Rc::new(RefCell::new(indices)),
        }
    }
}

impl EdgeRenderer for IndexedEdgeRenderer {
    fn render_with(&self, batch: &mut RenderBatch, params: EdgeParams) {
        batch.add_one_shot(Box::new(RenderEdges {
            vertex_array: Rc::clone(&self.vertex_array),
            source: EdgeSource::Indices(Rc::clone(&self.indices)),
            params,
        }));
    }
}

enum EdgeSource {
    Ranges(IndexRangeMap),
    Indices(Rc<RefCell<IndexArray>>),
}

struct RenderEdges {
    vertex_array: Rc<RefCell<VertexArray>>,
    source: EdgeSource,
    params: EdgeParams,
}

impl RenderEdges {
    fn is_empty(&self) -> bool {
        match &self.source {
            EdgeSource::Ranges(_) => self.vertex_array.borrow().is_empty(),
            EdgeSource::Indices(indices) => {
                self.vertex_array.borrow().is_empty() || indices.borrow().is_empty()
            }
        }
    }

    fn draw(&self, state: &RenderState<'_>) -> Result<()> {
        let shader_manager = state.shader_manager();
        let shader = ActiveShader::new(shader_manager, state.transformation(), &shaders::EDGE)?;

        let bounds = state.soft_map_bounds();
        let (min, max) = bounds.unwrap_or((Vec3::ZERO, Vec3::ZERO));
        let bounds_color = state
            .context()
            .config()
            .colors
            .soft_map_bounds
            .with_alpha(SOFT_MAP_BOUNDS_ALPHA);
        shader.set("u_show_soft_map_bounds", &bounds.is_some())?;
        shader.set("u_soft_map_bounds_min", &min)?;
        shader.set("u_soft_map_bounds_max", &max)?;
        shader.set("u_soft_map_bounds_color", &bounds_color)?;
        shader.set("u_use_uniform_color", &self.params.color.is_some())?;
        shader.set("u_color", &self.params.color.unwrap_or(Color::WHITE))?;

        let mut vertex_array = self.vertex_array.borrow_mut();
        match &self.source {
            EdgeSource::Ranges(ranges) => ranges.render(&mut vertex_array, shader_manager),
            EdgeSource::Indices(indices) => {
                vertex_array.render_indexed(shader_manager, PrimType::Lines, &indices.borrow())
            }
        }
    }
}

impl Renderable for RenderEdges {
    fn prepare_vertices(&mut self, vbos: &VboManager) -> Result<()> {
        self.vertex_array.borrow_mut().prepare(vbos)?;
        if let EdgeSource::Indices(indices) = &self.source {
            indices.borrow_mut().prepare(vbos)?;
        }
        Ok(())
    }

    fn render(&mut self, state: &mut RenderState<'_>) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let gl = state.gl();
        if self.params.offset != 0.0 {
            render_utils::set_edge_offset(gl, self.params.offset);
        }
        gl.line_width(self.params.width);
        if self.params.on_top {
            gl.disable(Capability::DepthTest);
        }

        let result = self.draw(state);

        if self.params.on_top {
            gl.enable(Capability::DepthTest);
        }
        gl.line_width(1.0);
        if self.params.offset != 0.0 {
            render_utils::reset_edge_offset(gl);
        }
        result
    }
}
