//! Bounds of the current selection with size annotations

use super::edge_renderer::{EdgeRenderer, IndexedEdgeRenderer};
use super::text_anchor::{PointTextAnchor, TextAlignment, TextAnchor};
use super::text_renderer::TextRenderer;
use crate::core::{BBox3, Camera};
use crate::error::Result;
use crate::graphics::{IndexArray, VertexArray, VertexP3};
use crate::render::{RenderBatch, RenderState};
use glam::{Vec2, Vec3, Vec3Swizzles};

/// Pixels between a label and the edge it annotates
const LABEL_GAP: f32 = 4.0;

/// Corner indices of the twelve box edges, see [`BBox3::corners`]
const EDGE_INDICES: [u32; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, // bottom
    4, 5, 5, 6, 6, 7, 7, 4, // top
    0, 4, 1, 5, 2, 6, 3, 7, // sides
];

pub struct SelectionBoundsRenderer {
    bounds: BBox3,
}

impl SelectionBoundsRenderer {
    pub fn new(bounds: BBox3) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> &BBox3 {
        &self.bounds
    }

    /// Queue the box edges and its labels
    pub fn render(&self, state: &RenderState<'_>, batch: &mut RenderBatch) -> Result<()> {
        if self.bounds.is_empty() {
            return Ok(());
        }
        let colors = &state.context().config().colors;

        let vertices: Vec<VertexP3> = self.bounds.corners().into_iter().map(VertexP3::new).collect();
        IndexedEdgeRenderer::new(
            VertexArray::new(&vertices),
            IndexArray::new(EDGE_INDICES.to_vec()),
        )
        .render_colored(batch, colors.selection_bounds, 1.0, 0.0);

        let mut text = TextRenderer::from_config(state.context().config());
        self.add_size_labels(state, &mut text)?;
        if state.render_3d() {
            self.add_min_max_labels(state, &mut text)?;
        }
        batch.add_one_shot(Box::new(text));
        Ok(())
    }

    fn add_size_labels(&self, state: &RenderState<'_>, text: &mut TextRenderer) -> Result<()> {
        let colors = &state.context().config().colors;
        let camera = state.camera();
        let size = self.bounds.size();
        for axis in 0..3 {
            if state.render_2d() && camera.view_axis() == axis {
                continue;
            }
            let label = format!("{}: {}", ["X", "Y", "Z"][axis], format_number(size[axis]));
            let anchor = SizeTextAnchor {
                bounds: self.bounds,
                axis,
            };
            text.render_string(
                state,
                colors.info_overlay_text,
                colors.info_overlay_background,
                &label,
                &anchor,
            )?;
        }
        Ok(())
    }

    fn add_min_max_labels(&self, state: &RenderState<'_>, text: &mut TextRenderer) -> Result<()> {
        let colors = &state.context().config().colors;
        let labels = [
            (self.bounds.min, "Min", TextAlignment::Top, Vec2::new(0.0, -LABEL_GAP)),
            (self.bounds.max, "Max", TextAlignment::Bottom, Vec2::new(0.0, LABEL_GAP)),
        ];
        for (corner, name, alignment, extra) in labels {
            let label = format!("{name}: {}", format_vec(corner));
            let anchor = PointTextAnchor::with_alignment(corner, alignment, extra);
            text.render_string(
                state,
                colors.info_overlay_text,
                colors.info_overlay_background,
                &label,
                &anchor,
            )?;
        }
        Ok(())
    }
}

/// Up to two decimals without trailing zeros
fn format_number(value: f32) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

fn format_vec(v: Vec3) -> String {
    format!("{} {} {}", format_number(v.x), format_number(v.y), format_number(v.z))
}

/// Anchors the size label of one axis to the box edge along that axis
/// that appears lowest (for horizontal edges) or leftmost (for vertical
/// edges) on screen.
struct SizeTextAnchor {
    bounds: BBox3,
    axis: usize,
}

impl SizeTextAnchor {
    fn is_horizontal(&self, camera: &Camera) -> bool {
        let mut step = Vec3::ZERO;
        step[self.axis] = 1.0;
        let center = self.bounds.center();
        let delta = camera.project(center + step).xy() - camera.project(center).xy();
        delta.x.abs() >= delta.y.abs()
    }

    fn edge_midpoint(&self, camera: &Camera) -> Vec3 {
        let (u, v) = ((self.axis + 1) % 3, (self.axis + 2) % 3);
        let horizontal = self.is_horizontal(camera);
        let mut best = self.bounds.center();
        let mut best_score = f32::INFINITY;
        for pu in [self.bounds.min[u], self.bounds.max[u]] {
            for pv in [self.bounds.min[v], self.bounds.max[v]] {
                let mut midpoint = self.bounds.center();
                midpoint[u] = pu;
                midpoint[v] = pv;
                let window = camera.project(midpoint);
                let score = if horizontal { window.y } else { window.x };
                // Prefer the nearer edge when two edges project onto each other
                let score = score + window.z * 1e-3;
                if score < best_score {
                    best_score = score;
                    best = midpoint;
                }
            }
        }
        best
    }
}

impl TextAnchor for SizeTextAnchor {
    fn position(&self, camera: &Camera) -> Vec3 {
        self.edge_midpoint(camera)
    }

    fn offset(&self, camera: &Camera, size: Vec2) -> Vec2 {
        let (alignment, extra) = if self.is_horizontal(camera) {
            (TextAlignment::Top, Vec2::new(0.0, -LABEL_GAP))
        } else {
            (TextAlignment::Right, Vec2::new(-LABEL_GAP, 0.0))
        };
        PointTextAnchor::with_alignment(self.edge_midpoint(camera), alignment, extra)
            .offset(camera, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Viewport;

    fn front_camera() -> Camera {
        // Looking along +Y: X to the right, Z up
        let mut camera = Camera::orthographic(-1000.0, 1000.0, Viewport::new(0, 0, 400, 300));
        camera.move_to(Vec3::new(0.0, -500.0, 0.0));
        camera
    }

    fn bounds() -> BBox3 {
        BBox3::new(Vec3::new(-32.0, -16.0, -8.0), Vec3::new(32.0, 16.0, 8.0))
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(64.0), "64");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.126), "0.13");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn test_edge_indices_cover_every_edge_once() {
        let mut edges: Vec<(u32, u32)> = EDGE_INDICES
            .chunks(2)
            .map(|pair| (pair[0].min(pair[1]), pair[0].max(pair[1])))
            .collect();
        edges.sort();
        edges.dedup();
        assert_eq!(edges.len(), 12);
    }

    #[test]
    fn test_horizontal_size_label_sits_below_box() {
        let camera = front_camera();
        let anchor = SizeTextAnchor { bounds: bounds(), axis: 0 };
        assert!(anchor.is_horizontal(&camera));
        let midpoint = anchor.edge_midpoint(&camera);
        assert_eq!(midpoint.x, 0.0);
        assert_eq!(midpoint.z, -8.0);
        // The front edge wins over the back edge
        assert_eq!(midpoint.y, -16.0);
    }

    #[test]
    fn test_vertical_size_label_sits_left_of_box() {
        let camera = front_camera();
        let anchor = SizeTextAnchor { bounds: bounds(), axis: 2 };
        assert!(!anchor.is_horizontal(&camera));
        let midpoint = anchor.edge_midpoint(&camera);
        assert_eq!(midpoint.x, -32.0);
        assert_eq!(midpoint.z, 0.0);
    }

    #[test]
    fn test_front_camera_skips_depth_axis() {
        assert_eq!(front_camera().view_axis(), 1);
    }
}
