//! Vertex and index arrays
//!
//! Arrays hold their data on the CPU until [`VertexArray::prepare`] uploads
//! it into a buffer object. Rendering requires a prepared array and a
//! current program; attributes are bound to the current program's inputs.

use super::vbo::{Vbo, VboManager};
use super::vertex::{GlVertex, VertexAttribute};
use super::PrimType;
use crate::error::{RenderError, Result};
use crate::gl::{BufferTarget, BufferUsage};
use crate::shaders::{ShaderManager, ShaderProgram};
use std::rc::Rc;
use tracing::trace;

/// Interleaved vertices of one layout
pub struct VertexArray {
    data: Vec<u8>,
    vertex_count: usize,
    stride: usize,
    attributes: &'static [VertexAttribute],
    vbo: Option<Vbo>,
    prepared: bool,
    bound_program: Option<Rc<ShaderProgram>>,
}

impl VertexArray {
    pub fn new<V: GlVertex>(vertices: &[V]) -> Self {
        Self {
            data: bytemuck::cast_slice(vertices).to_vec(),
            vertex_count: vertices.len(),
            stride: std::mem::size_of::<V>(),
            attributes: V::attributes(),
            vbo: None,
            prepared: false,
            bound_program: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            vertex_count: 0,
            stride: 0,
            attributes: &[],
            vbo: None,
            prepared: false,
            bound_program: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Size of the vertex data in bytes
    pub fn size(&self) -> usize {
        self.vertex_count * self.stride
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_set_up(&self) -> bool {
        self.bound_program.is_some()
    }

    /// Upload the vertices; does nothing if already prepared
    ///
    /// Empty arrays become prepared without allocating a buffer. The CPU
    /// copy of the data is released after the upload.
    pub fn prepare(&mut self, vbos: &VboManager) -> Result<()> {
        if self.prepared {
            return Ok(());
        }
        if !self.is_empty() {
            let vbo = vbos.allocate(BufferTarget::Array, BufferUsage::StaticDraw, self.size())?;
            vbo.bind();
            let written = vbo.write(vbo.offset(), &self.data);
            vbo.unbind();
            written?;
            self.vbo = Some(vbo);
            self.data = Vec::new();
        }
        self.prepared = true;
        Ok(())
    }

    /// Bind the buffer and the attributes to the current program
    pub fn setup(&mut self, shaders: &ShaderManager) -> Result<()> {
        if !self.prepared {
            return Err(RenderError::NotPrepared);
        }
        if self.bound_program.is_some() {
            return Ok(());
        }
        let program = shaders
            .current_program()
            .ok_or(RenderError::NoActiveProgram)?;

        if let Some(vbo) = &self.vbo {
            vbo.bind();
            let mut offset = vbo.offset();
            for attribute in self.attributes {
                attribute.setup(&program, self.stride, offset)?;
                offset += attribute.size();
            }
        }
        self.bound_program = Some(program);
        Ok(())
    }

    pub fn cleanup(&mut self) -> Result<()> {
        let Some(program) = self.bound_program.take() else {
            return Ok(());
        };
        if let Some(vbo) = &self.vbo {
            for attribute in self.attributes.iter().rev() {
                attribute.cleanup(&program)?;
            }
            vbo.unbind();
        }
        Ok(())
    }

    pub fn render(&mut self, shaders: &ShaderManager, prim: PrimType) -> Result<()> {
        let count = self.vertex_count;
        self.render_range(shaders, prim, 0, count)
    }

    pub fn render_range(
        &mut self,
        shaders: &ShaderManager,
        prim: PrimType,
        index: usize,
        count: usize,
    ) -> Result<()> {
        self.with_setup(shaders, |program| {
            trace!(?prim, index, count, "Draw arrays");
            program
                .gl()
                .draw_arrays(prim, index as i32, count as i32);
        })
    }

    /// Draw several ranges with one attribute setup
    pub fn render_multi(
        &mut self,
        shaders: &ShaderManager,
        prim: PrimType,
        indices: &[usize],
        counts: &[usize],
    ) -> Result<()> {
        self.with_setup(shaders, |program| {
            for (index, count) in indices.iter().zip(counts) {
                program
                    .gl()
                    .draw_arrays(prim, *index as i32, *count as i32);
            }
        })
    }

    pub fn render_indexed(
        &mut self,
        shaders: &ShaderManager,
        prim: PrimType,
        indices: &IndexArray,
    ) -> Result<()> {
        if !indices.prepared() {
            return Err(RenderError::NotPrepared);
        }
        self.with_setup(shaders, |program| {
            if let Some(vbo) = &indices.vbo {
                vbo.bind();
                program
                    .gl()
                    .draw_elements(prim, indices.len() as i32, vbo.offset());
                vbo.unbind();
            }
        })
    }

    fn with_setup(
        &mut self,
        shaders: &ShaderManager,
        draw: impl FnOnce(&ShaderProgram),
    ) -> Result<()> {
        if !self.prepared {
            return Err(RenderError::NotPrepared);
        }
        if self.is_empty() {
            return Ok(());
        }

        let was_set_up = self.is_set_up();
        if !was_set_up {
            self.setup(shaders)?;
        }
        if let Some(program) = &self.bound_program {
            draw(program);
        }
        if !was_set_up {
            self.cleanup()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexArray")
            .field("vertex_count", &self.vertex_count)
            .field("stride", &self.stride)
            .field("prepared", &self.prepared)
            .finish()
    }
}

/// Element indices into a [`VertexArray`]
#[derive(Debug)]
pub struct IndexArray {
    indices: Vec<u32>,
    count: usize,
    vbo: Option<Vbo>,
    prepared: bool,
}

impl IndexArray {
    pub fn new(indices: Vec<u32>) -> Self {
        Self {
            count: indices.len(),
            indices,
            vbo: None,
            prepared: false,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn prepared(&self) -> bool {
        self.prepared
    }

    pub fn prepare(&mut self, vbos: &VboManager) -> Result<()> {
        if self.prepared {
            return Ok(());
        }
        if !self.is_empty() {
            let bytes: &[u8] = bytemuck::cast_slice(&self.indices);
            let vbo = vbos.allocate(
                BufferTarget::ElementArray,
                BufferUsage::StaticDraw,
                bytes.len(),
            )?;
            vbo.bind();
            let written = vbo.write(vbo.offset(), bytes);
            vbo.unbind();
            written?;
            self.vbo = Some(vbo);
            self.indices = Vec::new();
        }
        self.prepared = true;
        Ok(())
    }
}
