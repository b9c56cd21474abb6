//! Ranges of vertices grouped by primitive type
//!
//! An [`IndexRangeMap`] records, per primitive type, which consecutive
//! vertex ranges of a [`VertexArray`] to draw. Adjacent ranges of list
//! primitives (points, lines, triangles) are merged into one.

use super::vertex::GlVertex;
use super::{PrimType, VboManager, VertexArray};
use crate::error::Result;
use crate::shaders::ShaderManager;
use std::collections::BTreeMap;

/// Expected number of ranges per primitive type, used to reserve capacity
#[derive(Debug, Clone, Default)]
pub struct IndexRangeMapSize {
    sizes: BTreeMap<PrimType, usize>,
}

impl IndexRangeMapSize {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&mut self, prim: PrimType, count: usize) {
        *self.sizes.entry(prim).or_default() += count;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Ranges {
    indices: Vec<usize>,
    counts: Vec<usize>,
}

impl Ranges {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            indices: Vec::with_capacity(capacity),
            counts: Vec::with_capacity(capacity),
        }
    }

    fn add(&mut self, prim: PrimType, index: usize, count: usize) {
        if prim.is_list() {
            if let (Some(last_index), Some(last_count)) =
                (self.indices.last(), self.counts.last_mut())
            {
                if last_index + *last_count == index {
                    *last_count += count;
                    return;
                }
            }
        }
        self.indices.push(index);
        self.counts.push(count);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexRangeMap {
    ranges: BTreeMap<PrimType, Ranges>,
}

impl IndexRangeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(size: &IndexRangeMapSize) -> Self {
        let ranges = size
            .sizes
            .iter()
            .map(|(prim, count)| (*prim, Ranges::with_capacity(*count)))
            .collect();
        Self { ranges }
    }

    /// A map holding a single range
    pub fn single(prim: PrimType, index: usize, count: usize) -> Self {
        let mut map = Self::new();
        map.add(prim, index, count);
        map
    }

    pub fn add(&mut self, prim: PrimType, index: usize, count: usize) {
        self.ranges.entry(prim).or_default().add(prim, index, count);
    }

    pub fn add_map(&mut self, other: &IndexRangeMap) {
        for (prim, ranges) in &other.ranges {
            for (index, count) in ranges.indices.iter().zip(&ranges.counts) {
                self.add(*prim, *index, *count);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// `(index, count)` pairs recorded for `prim`
    pub fn ranges(&self, prim: PrimType) -> Vec<(usize, usize)> {
        self.ranges
            .get(&prim)
            .map(|r| r.indices.iter().copied().zip(r.counts.iter().copied()).collect())
            .unwrap_or_default()
    }

    /// Draw every range; each primitive type is set up once
    pub fn render(&self, array: &mut VertexArray, shaders: &ShaderManager) -> Result<()> {
        for (prim, ranges) in &self.ranges {
            array.render_multi(shaders, *prim, &ranges.indices, &ranges.counts)?;
        }
        Ok(())
    }
}

/// Collects vertices and the ranges that draw them
#[derive(Debug, Clone)]
pub struct IndexRangeMapBuilder<V> {
    vertices: Vec<V>,
    ranges: IndexRangeMap,
}

impl<V: GlVertex> IndexRangeMapBuilder<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            ranges: IndexRangeMap::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, size: &IndexRangeMapSize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            ranges: IndexRangeMap::with_size(size),
        }
    }

    pub fn add(&mut self, prim: PrimType, vertices: &[V]) {
        if vertices.is_empty() {
            return;
        }
        self.ranges.add(prim, self.vertices.len(), vertices.len());
        self.vertices.extend_from_slice(vertices);
    }

    pub fn add_points(&mut self, vertices: &[V]) {
        self.add(PrimType::Points, vertices);
    }

    pub fn add_lines(&mut self, vertices: &[V]) {
        self.add(PrimType::Lines, vertices);
    }

    pub fn add_line_loop(&mut self, vertices: &[V]) {
        self.add(PrimType::LineLoop, vertices);
    }

    pub fn add_triangles(&mut self, vertices: &[V]) {
        self.add(PrimType::Triangles, vertices);
    }

    pub fn add_triangle_fan(&mut self, vertices: &[V]) {
        self.add(PrimType::TriangleFan, vertices);
    }

    pub fn add_triangle_strip(&mut self, vertices: &[V]) {
        self.add(PrimType::TriangleStrip, vertices);
    }

    pub fn vertices(&self) -> &[V] {
        &self.vertices
    }

    pub fn ranges(&self) -> &IndexRangeMap {
        &self.ranges
    }

    pub fn build(self) -> IndexRangeRenderer {
        IndexRangeRenderer::new(VertexArray::new(&self.vertices), self.ranges)
    }
}

impl<V: GlVertex> Default for IndexRangeMapBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// A vertex array together with the ranges to draw from it
#[derive(Debug)]
pub struct IndexRangeRenderer {
    array: VertexArray,
    ranges: IndexRangeMap,
}

impl IndexRangeRenderer {
    pub fn new(array: VertexArray, ranges: IndexRangeMap) -> Self {
        Self { array, ranges }
    }

    pub fn prepare(&mut self, vbos: &VboManager) -> Result<()> {
        self.array.prepare(vbos)
    }

    pub fn render(&mut self, shaders: &ShaderManager) -> Result<()> {
        self.ranges.render(&mut self.array, shaders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::VertexP3;
    use glam::Vec3;

    #[test]
    fn test_list_ranges_merge() {
        let mut map = IndexRangeMap::new();
        map.add(PrimType::Lines, 0, 2);
        map.add(PrimType::Lines, 2, 4);
        map.add(PrimType::Lines, 10, 2);
        assert_eq!(map.ranges(PrimType::Lines), vec![(0, 6), (10, 2)]);
    }

    #[test]
    fn test_strip_ranges_do_not_merge() {
        let mut map = IndexRangeMap::new();
        map.add(PrimType::TriangleFan, 0, 4);
        map.add(PrimType::TriangleFan, 4, 4);
        assert_eq!(map.ranges(PrimType::TriangleFan), vec![(0, 4), (4, 4)]);
    }

    #[test]
    fn test_add_map() {
        let mut a = IndexRangeMap::single(PrimType::Points, 0, 1);
        let b = IndexRangeMap::single(PrimType::Points, 1, 3);
        a.add_map(&b);
        assert_eq!(a.ranges(PrimType::Points), vec![(0, 4)]);
    }

    #[test]
    fn test_builder_records_offsets() {
        let v = VertexP3::new(Vec3::ZERO);
        let mut size = IndexRangeMapSize::new();
        size.inc(PrimType::Lines, 1);
        let mut builder = IndexRangeMapBuilder::with_capacity(6, &size);
        builder.add_lines(&[v, v]);
        builder.add_triangle_fan(&[v, v, v, v]);
        builder.add_lines(&[]);
        assert_eq!(builder.vertices().len(), 6);
        assert_eq!(builder.ranges().ranges(PrimType::Lines), vec![(0, 2)]);
        assert_eq!(builder.ranges().ranges(PrimType::TriangleFan), vec![(2, 4)]);
    }
}
